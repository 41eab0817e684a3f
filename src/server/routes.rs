use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::server::AppState;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type NotFound = (StatusCode, Json<ErrorResponse>);

fn not_found(resource: &str) -> NotFound {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{} not found", resource),
        }),
    )
}

/// A holding row in the mock portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

impl Investment {
    /// The stock mock rows the dashboard ships with
    pub fn seed() -> Vec<Self> {
        vec![
            Investment {
                id: 1,
                symbol: "AAPL".into(),
                name: "Apple Inc.".into(),
                quantity: 10.0,
                price: 150.00,
            },
            Investment {
                id: 2,
                symbol: "GOOGL".into(),
                name: "Alphabet Inc.".into(),
                quantity: 5.0,
                price: 2800.00,
            },
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct NewInvestment {
    pub symbol: String,
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvestmentPatch {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

/// An analyst pick in the mock recommendations feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub reason: String,
    pub risk: String,
}

impl Recommendation {
    pub fn seed() -> Vec<Self> {
        vec![
            Recommendation {
                id: 1,
                symbol: "TSLA".into(),
                name: "Tesla Inc.".into(),
                reason: "High growth potential".into(),
                risk: "High".into(),
            },
            Recommendation {
                id: 2,
                symbol: "MSFT".into(),
                name: "Microsoft Corp.".into(),
                reason: "Stable returns".into(),
                risk: "Low".into(),
            },
        ]
    }
}

#[derive(Debug, Deserialize)]
pub struct NewRecommendation {
    pub symbol: String,
    pub name: String,
    pub reason: String,
    pub risk: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationPatch {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub reason: Option<String>,
    pub risk: Option<String>,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ========== Investments ==========

pub async fn list_investments(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let investments = state.investments.read().await;
    Json(serde_json::json!({"investments": investments.rows}))
}

pub async fn get_investment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, NotFound> {
    let investments = state.investments.read().await;
    let investment = investments
        .rows
        .iter()
        .find(|inv| inv.id == id)
        .ok_or_else(|| not_found("Investment"))?;
    Ok(Json(serde_json::json!({"investment": investment})))
}

pub async fn create_investment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewInvestment>,
) -> Json<serde_json::Value> {
    let mut investments = state.investments.write().await;
    let investment = Investment {
        id: investments.next_id(),
        symbol: body.symbol,
        name: body.name,
        quantity: body.quantity,
        price: body.price,
    };
    investments.rows.push(investment.clone());
    Json(serde_json::json!({"investment": investment}))
}

pub async fn update_investment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<InvestmentPatch>,
) -> Result<Json<serde_json::Value>, NotFound> {
    let mut investments = state.investments.write().await;
    let investment = investments
        .rows
        .iter_mut()
        .find(|inv| inv.id == id)
        .ok_or_else(|| not_found("Investment"))?;

    if let Some(symbol) = patch.symbol {
        investment.symbol = symbol;
    }
    if let Some(name) = patch.name {
        investment.name = name;
    }
    if let Some(quantity) = patch.quantity {
        investment.quantity = quantity;
    }
    if let Some(price) = patch.price {
        investment.price = price;
    }

    Ok(Json(serde_json::json!({"investment": investment.clone()})))
}

pub async fn delete_investment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, NotFound> {
    let mut investments = state.investments.write().await;
    let index = investments
        .rows
        .iter()
        .position(|inv| inv.id == id)
        .ok_or_else(|| not_found("Investment"))?;
    investments.rows.remove(index);
    Ok(Json(serde_json::json!({"message": "Investment deleted"})))
}

// ========== Recommendations ==========

pub async fn list_recommendations(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let recommendations = state.recommendations.read().await;
    Json(serde_json::json!({"recommendations": recommendations.rows}))
}

pub async fn get_recommendation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, NotFound> {
    let recommendations = state.recommendations.read().await;
    let recommendation = recommendations
        .rows
        .iter()
        .find(|rec| rec.id == id)
        .ok_or_else(|| not_found("Recommendation"))?;
    Ok(Json(serde_json::json!({"recommendation": recommendation})))
}

pub async fn create_recommendation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewRecommendation>,
) -> Json<serde_json::Value> {
    let mut recommendations = state.recommendations.write().await;
    let recommendation = Recommendation {
        id: recommendations.next_id(),
        symbol: body.symbol,
        name: body.name,
        reason: body.reason,
        risk: body.risk,
    };
    recommendations.rows.push(recommendation.clone());
    Json(serde_json::json!({"recommendation": recommendation}))
}

pub async fn update_recommendation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<RecommendationPatch>,
) -> Result<Json<serde_json::Value>, NotFound> {
    let mut recommendations = state.recommendations.write().await;
    let recommendation = recommendations
        .rows
        .iter_mut()
        .find(|rec| rec.id == id)
        .ok_or_else(|| not_found("Recommendation"))?;

    if let Some(symbol) = patch.symbol {
        recommendation.symbol = symbol;
    }
    if let Some(name) = patch.name {
        recommendation.name = name;
    }
    if let Some(reason) = patch.reason {
        recommendation.reason = reason;
    }
    if let Some(risk) = patch.risk {
        recommendation.risk = risk;
    }

    Ok(Json(serde_json::json!({"recommendation": recommendation.clone()})))
}

pub async fn delete_recommendation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, NotFound> {
    let mut recommendations = state.recommendations.write().await;
    let index = recommendations
        .rows
        .iter()
        .position(|rec| rec.id == id)
        .ok_or_else(|| not_found("Recommendation"))?;
    recommendations.rows.remove(index);
    Ok(Json(serde_json::json!({"message": "Recommendation deleted"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::seeded())
    }

    #[tokio::test]
    async fn test_list_investments_returns_seed() {
        let response = list_investments(State(state())).await;
        let investments = response.0["investments"].as_array().unwrap().clone();
        assert_eq!(investments.len(), 2);
        assert_eq!(investments[0]["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn test_get_missing_investment_is_404() {
        let err = get_investment(State(state()), Path(99)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_then_get_investment() {
        let state = state();
        let created = create_investment(
            State(state.clone()),
            Json(NewInvestment {
                symbol: "NVDA".into(),
                name: "NVIDIA Corp.".into(),
                quantity: 3.0,
                price: 900.0,
            }),
        )
        .await;
        let id = created.0["investment"]["id"].as_i64().unwrap();
        assert_eq!(id, 3);

        let fetched = get_investment(State(state), Path(id)).await.unwrap();
        assert_eq!(fetched.0["investment"]["symbol"], "NVDA");
    }

    #[tokio::test]
    async fn test_update_investment_merges_fields() {
        let state = state();
        let updated = update_investment(
            State(state.clone()),
            Path(1),
            Json(InvestmentPatch {
                price: Some(175.5),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.0["investment"]["price"], 175.5);
        // Unpatched fields survive
        assert_eq!(updated.0["investment"]["symbol"], "AAPL");
        assert_eq!(updated.0["investment"]["quantity"], 10.0);
    }

    #[tokio::test]
    async fn test_delete_investment_then_404() {
        let state = state();
        delete_investment(State(state.clone()), Path(1)).await.unwrap();

        let err = get_investment(State(state.clone()), Path(1)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let response = list_investments(State(state)).await;
        assert_eq!(response.0["investments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let state = state();
        delete_investment(State(state.clone()), Path(2)).await.unwrap();

        let created = create_investment(
            State(state),
            Json(NewInvestment {
                symbol: "AMD".into(),
                name: "Advanced Micro Devices".into(),
                quantity: 8.0,
                price: 160.0,
            }),
        )
        .await;
        assert_eq!(created.0["investment"]["id"].as_i64().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_recommendation_crud() {
        let state = state();

        let response = list_recommendations(State(state.clone())).await;
        assert_eq!(response.0["recommendations"].as_array().unwrap().len(), 2);

        let updated = update_recommendation(
            State(state.clone()),
            Path(2),
            Json(RecommendationPatch {
                risk: Some("Medium".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.0["recommendation"]["risk"], "Medium");
        assert_eq!(updated.0["recommendation"]["symbol"], "MSFT");

        delete_recommendation(State(state.clone()), Path(2)).await.unwrap();
        let err = get_recommendation(State(state), Path(2)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
