use serde::{Deserialize, Serialize};

use crate::decode::round2;

/// Nutrient profile per 100 g of a food.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrients {
    pub calories: f64,
    pub carbohydrates: f64,
    pub protein: f64,
    pub fats: f64,
    pub free_sugar: f64,
    pub fibre: f64,
    pub sodium: f64,
    pub calcium: f64,
    pub iron: f64,
    pub vitamin_c: f64,
    pub folate: f64,
}

impl Nutrients {
    /// Values for `quantity_g` grams, each field rounded to 2 places on its own.
    pub fn scaled_to(&self, quantity_g: f64) -> Self {
        let scale = quantity_g / 100.0;
        let s = |v: f64| round2(v * scale);
        Self {
            calories: s(self.calories),
            carbohydrates: s(self.carbohydrates),
            protein: s(self.protein),
            fats: s(self.fats),
            free_sugar: s(self.free_sugar),
            fibre: s(self.fibre),
            sodium: s(self.sodium),
            calcium: s(self.calcium),
            iron: s(self.iron),
            vitamin_c: s(self.vitamin_c),
            folate: s(self.folate),
        }
    }
}

/// One entry of the nutrient index. Custom foods also carry image references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientRecord {
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl NutrientRecord {
    /// A user-defined food: macros from the form, micronutrients zeroed.
    pub fn custom(calories: f64, protein: f64, carbohydrates: f64, fats: f64, images: Vec<String>) -> Self {
        Self {
            nutrients: Nutrients {
                calories,
                protein,
                carbohydrates,
                fats,
                ..Nutrients::default()
            },
            images: Some(images),
        }
    }
}
