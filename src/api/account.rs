use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use crate::api::types::{FavoritesEnvelope, RawFavorite};
use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::account::{Favorite, NotificationPreferences, Subscription};
use crate::models::FilterState;
use crate::search::{map_filters, normalize_listing};

/// Signed-in user's favorites, search subscriptions and notification
/// settings. Every call needs a bearer token on the [`ApiClient`].
#[derive(Debug, Clone)]
pub struct AccountClient {
    api: ApiClient,
}

impl AccountClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_favorites(&self) -> Result<Vec<Favorite>, ApiError> {
        let url = self.api.endpoint("favorites")?;
        let request = self.api.authorized(Method::GET, url)?;
        let envelope: FavoritesEnvelope = self.api.execute_json(request, "list favorites").await?;
        Ok(envelope.into_vec().into_iter().map(favorite_from_raw).collect())
    }

    pub async fn add_favorite(&self, listing_id: &str) -> Result<(), ApiError> {
        let url = self.api.endpoint("favorites")?;
        let request = self
            .api
            .authorized(Method::POST, url)?
            .json(&json!({ "listing_id": listing_id }));
        self.api.execute(request, "add favorite").await?;
        info!("⭐ Added listing {} to favorites", listing_id);
        Ok(())
    }

    pub async fn remove_favorite(&self, listing_id: &str) -> Result<(), ApiError> {
        let url = self.api.item_endpoint("favorites", listing_id)?;
        let request = self.api.authorized(Method::DELETE, url)?;
        self.api.execute(request, "remove favorite").await?;
        info!("Removed listing {} from favorites", listing_id);
        Ok(())
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let url = self.api.endpoint("subscriptions")?;
        let request = self.api.authorized(Method::GET, url)?;
        self.api.execute_json(request, "list subscriptions").await
    }

    /// Subscribe to new listings matching `filters`. The backend stores the
    /// same parameters the search endpoint receives.
    pub async fn create_subscription(
        &self,
        name: &str,
        filters: &FilterState,
    ) -> Result<Subscription, ApiError> {
        let url = self.api.endpoint("subscriptions")?;
        let body = json!({
            "name": name,
            "filters": Value::Object(map_filters(filters).to_json()),
        });
        let request = self.api.authorized(Method::POST, url)?.json(&body);
        let subscription: Subscription = self
            .api
            .execute_json(request, "create subscription")
            .await?;
        info!("🔔 Subscribed to \"{}\" ({})", subscription.name, subscription.id);
        Ok(subscription)
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<(), ApiError> {
        let url = self.api.item_endpoint("subscriptions", id)?;
        let request = self.api.authorized(Method::DELETE, url)?;
        self.api.execute(request, "delete subscription").await?;
        Ok(())
    }

    pub async fn notification_preferences(&self) -> Result<NotificationPreferences, ApiError> {
        let url = self.api.endpoint("notifications/preferences")?;
        let request = self.api.authorized(Method::GET, url)?;
        self.api
            .execute_json(request, "get notification preferences")
            .await
    }

    pub async fn update_notification_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences, ApiError> {
        let url = self.api.endpoint("notifications/preferences")?;
        let request = self.api.authorized(Method::PUT, url)?.json(preferences);
        self.api
            .execute_json(request, "update notification preferences")
            .await
    }
}

fn favorite_from_raw(raw: RawFavorite) -> Favorite {
    let listing = normalize_listing(&raw.listing);
    let listing_id = match raw.listing_id {
        Some(Value::String(id)) => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => listing.id.clone(),
    };
    Favorite {
        listing_id,
        listing,
        added_at: raw.created_at,
    }
}
