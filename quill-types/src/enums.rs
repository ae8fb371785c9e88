use serde::{Deserialize, Serialize};

/// Ordering options for book listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BookOrdering {
    #[default]
    Title,
    TitleDesc,
    PublicationYear,
    PublicationYearDesc,
}

impl BookOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookOrdering::Title => "title",
            BookOrdering::TitleDesc => "-title",
            BookOrdering::PublicationYear => "publication_year",
            BookOrdering::PublicationYearDesc => "-publication_year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "title" => Some(BookOrdering::Title),
            "-title" => Some(BookOrdering::TitleDesc),
            "publication_year" => Some(BookOrdering::PublicationYear),
            "-publication_year" => Some(BookOrdering::PublicationYearDesc),
            _ => None,
        }
    }
}

/// Ordering options for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PostOrdering {
    /// Newest first.
    #[default]
    PublishedDateDesc,
    PublishedDate,
    Title,
    TitleDesc,
}

impl PostOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostOrdering::PublishedDateDesc => "-published_date",
            PostOrdering::PublishedDate => "published_date",
            PostOrdering::Title => "title",
            PostOrdering::TitleDesc => "-title",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "-published_date" => Some(PostOrdering::PublishedDateDesc),
            "published_date" => Some(PostOrdering::PublishedDate),
            "title" => Some(PostOrdering::Title),
            "-title" => Some(PostOrdering::TitleDesc),
            _ => None,
        }
    }
}

/// Behavior on a repeated follow or like, and on removing one that does
/// not exist. Source systems disagree on this, so it is configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPolicy {
    /// Duplicate attempts are rejected with a 400 response.
    #[default]
    Reject,
    /// Duplicate attempts succeed silently.
    Ignore,
}

impl RepeatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatPolicy::Reject => "reject",
            RepeatPolicy::Ignore => "ignore",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Some(RepeatPolicy::Reject),
            "ignore" => Some(RepeatPolicy::Ignore),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse_round_trip() {
        for ordering in [
            BookOrdering::Title,
            BookOrdering::TitleDesc,
            BookOrdering::PublicationYear,
            BookOrdering::PublicationYearDesc,
        ] {
            assert_eq!(BookOrdering::parse(ordering.as_str()), Some(ordering));
        }
        assert_eq!(BookOrdering::parse("garbage"), None);

        for ordering in [
            PostOrdering::PublishedDateDesc,
            PostOrdering::PublishedDate,
            PostOrdering::Title,
            PostOrdering::TitleDesc,
        ] {
            assert_eq!(PostOrdering::parse(ordering.as_str()), Some(ordering));
        }
    }

    #[test]
    fn test_repeat_policy_parse_is_case_insensitive() {
        assert_eq!(RepeatPolicy::parse("REJECT"), Some(RepeatPolicy::Reject));
        assert_eq!(RepeatPolicy::parse("Ignore"), Some(RepeatPolicy::Ignore));
        assert_eq!(RepeatPolicy::parse("sometimes"), None);
    }
}
