pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, status, success, summary_row, warn};
pub use table::{groups_table, services_table, watchlist_table};
pub use theme::{theme, Theme};
