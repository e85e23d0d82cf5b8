use serde::{Deserialize, Serialize};

const GREEN_RATINGS: &[&str] = &["A+", "A", "A-", "B+", "B"];
const YELLOW_RATINGS: &[&str] = &["B-", "C", "C+"];
const RED_RATINGS: &[&str] = &["C-", "D+", "D", "D-"];

/// Colour band used by the dashboard to flag a rating category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBand {
    Green,
    Yellow,
    Red,
    /// Unrecognised rating; rendered without colour.
    #[serde(rename = "")]
    Unrated,
}

impl RatingBand {
    pub fn from_rating(rating: &str) -> Self {
        let rating = rating.trim();
        if GREEN_RATINGS.contains(&rating) {
            RatingBand::Green
        } else if YELLOW_RATINGS.contains(&rating) {
            RatingBand::Yellow
        } else if RED_RATINGS.contains(&rating) {
            RatingBand::Red
        } else {
            RatingBand::Unrated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(RatingBand::from_rating("A+"), RatingBand::Green);
        assert_eq!(RatingBand::from_rating("B"), RatingBand::Green);
        assert_eq!(RatingBand::from_rating("B-"), RatingBand::Yellow);
        assert_eq!(RatingBand::from_rating("C+"), RatingBand::Yellow);
        assert_eq!(RatingBand::from_rating("C-"), RatingBand::Red);
        assert_eq!(RatingBand::from_rating(" D- "), RatingBand::Red);
        assert_eq!(RatingBand::from_rating("AAA"), RatingBand::Unrated);
    }

    #[test]
    fn test_unrated_serialises_empty() {
        assert_eq!(serde_json::to_string(&RatingBand::Unrated).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&RatingBand::Yellow).unwrap(), "\"yellow\"");
    }
}
