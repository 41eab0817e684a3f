pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const EYE: &str = "👀";
    pub const STAR: &str = "⭐";
    pub const TAG: &str = "🏷️";
    pub const FOLDER: &str = "📁";
    pub const WHALE: &str = "🐳";
    pub const DEL: &str = "🗑️";
    pub const NOTE: &str = "📝";
}
