use sea_orm::{TransactionTrait, prelude::*};

use crate::{EngineError, Profile, ResultEngine, error::StoreResultExt, profiles};

use super::{Engine, normalize_optional_text, normalize_required_id, with_tx};

impl Engine {
    /// Creates or replaces the display data of a user.
    pub async fn upsert_profile(&self, profile: Profile) -> ResultEngine<Profile> {
        let profile = Profile {
            id: normalize_required_id(&profile.id, "user id")?,
            full_name: normalize_optional_text(profile.full_name.as_deref()),
            email: normalize_optional_text(profile.email.as_deref()),
        };

        with_tx!(self, EngineError::StoreWrite, |db_tx| {
            let existing = profiles::Entity::find_by_id(profile.id.clone())
                .one(&db_tx)
                .await
                .on_read()?;
            let model = profiles::ActiveModel::from(&profile);
            let saved = if existing.is_some() {
                model.update(&db_tx).await.on_write()?
            } else {
                model.insert(&db_tx).await.on_write()?
            };
            tracing::debug!(user_id = %saved.id, created = existing.is_none(), "profile saved");
            Ok(Profile::from(saved))
        })
    }

    pub async fn profile(&self, user_id: &str) -> ResultEngine<Profile> {
        profiles::Entity::find_by_id(user_id.trim().to_string())
            .one(&self.database)
            .await
            .on_read()?
            .map(Profile::from)
            .ok_or_else(|| EngineError::KeyNotFound("profile not exists".to_string()))
    }
}
