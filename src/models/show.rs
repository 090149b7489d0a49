use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AstronomyShow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
}

impl AstronomyShow {
    /// Storage name for an uploaded image: slugified title plus a random
    /// component, keeping the original extension.
    pub fn image_file_name(&self, extension: &str) -> String {
        format!(
            "{}-{}{}",
            slug::slugify(&self.title),
            uuid::Uuid::new_v4(),
            extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(title: &str) -> AstronomyShow {
        AstronomyShow {
            id: 1,
            title: title.to_string(),
            description: String::new(),
            image: None,
        }
    }

    #[test]
    fn image_file_name_slugifies_title_and_keeps_extension() {
        let name = show("The Sky Tonight").image_file_name(".jpg");
        assert!(name.starts_with("the-sky-tonight-"));
        assert!(name.ends_with(".jpg"));

        let random_part = name
            .strip_prefix("the-sky-tonight-")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap();
        assert!(uuid::Uuid::parse_str(random_part).is_ok());
    }

    #[test]
    fn image_file_names_are_unique_per_upload() {
        let s = show("Mars at Night");
        assert_ne!(s.image_file_name(".png"), s.image_file_name(".png"));
    }
}
