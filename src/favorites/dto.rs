use serde::Deserialize;

use crate::{
    error::ApiError,
    store::{FavoritePatch, NewFavorite},
    validation::{optional, Validate},
};

#[derive(Debug, Deserialize)]
pub struct CreateFavoriteBody {
    pub user_id: Option<i64>,
    pub card_name: Option<String>,
    pub scryfall_id: Option<String>,
    pub ability_type: Option<String>,
    pub notes: Option<String>,
}

impl Validate for CreateFavoriteBody {
    type Output = NewFavorite;

    fn validate(self) -> Result<NewFavorite, ApiError> {
        let card_name = optional(self.card_name);
        let (Some(user_id), Some(card_name)) = (self.user_id, card_name) else {
            return Err(ApiError::InvalidInput(
                "user_id and card_name are required".into(),
            ));
        };
        Ok(NewFavorite {
            user_id,
            card_name: card_name.trim().to_string(),
            scryfall_id: optional(self.scryfall_id),
            ability_type: optional(self.ability_type),
            notes: optional(self.notes),
        })
    }
}

/// Only fields present in the body are overwritten.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFavoriteBody {
    pub notes: Option<String>,
    pub ability_type: Option<String>,
}

impl Validate for UpdateFavoriteBody {
    type Output = FavoritePatch;

    fn validate(self) -> Result<FavoritePatch, ApiError> {
        Ok(FavoritePatch {
            notes: self.notes,
            ability_type: self.ability_type,
        })
    }
}
