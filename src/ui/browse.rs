use std::cmp::Ordering;
use std::fmt;

use crate::catalog::{Experience, Genre};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Player count, highest first
    #[default]
    Popular,
    /// Numeric id, highest first
    Newest,
    /// Title, case-insensitive
    AZ,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Popular, SortOrder::Newest, SortOrder::AZ];

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Popular => "Popular",
            SortOrder::Newest => "Newest",
            SortOrder::AZ => "A-Z",
        }
    }

    fn compare(&self, a: &Experience, b: &Experience) -> Ordering {
        match self {
            SortOrder::Popular => b.player_count.cmp(&a.player_count),
            // Ids that aren't numbers sort after every numeric one
            SortOrder::Newest => match (a.numeric_id(), b.numeric_id()) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortOrder::AZ => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Only(Genre),
}

impl GenreFilter {
    /// `All` followed by every genre, in pill order
    pub fn options() -> impl Iterator<Item = GenreFilter> {
        std::iter::once(GenreFilter::All).chain(Genre::ALL.into_iter().map(GenreFilter::Only))
    }

    pub fn label(&self) -> &'static str {
        match self {
            GenreFilter::All => "All",
            GenreFilter::Only(genre) => genre.label(),
        }
    }

    pub fn matches(&self, experience: &Experience) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::Only(genre) => experience.genre == *genre,
        }
    }
}

/// Filter then sort. The sort is stable, so equal keys keep input order.
pub fn compose<'a, I>(experiences: I, filter: GenreFilter, sort: SortOrder) -> Vec<&'a Experience>
where
    I: IntoIterator<Item = &'a Experience>,
{
    let mut shown: Vec<&Experience> = experiences
        .into_iter()
        .filter(|e| filter.matches(e))
        .collect();
    shown.sort_by(|a, b| sort.compare(a, b));
    shown
}

/// `1.2M`, `45.2K`, or the raw number below a thousand
pub fn format_player_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Per-grid filter and sort selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridControls {
    pub filter: GenreFilter,
    pub sort: SortOrder,
}

impl GridControls {
    pub fn apply<'a>(&self, experiences: &'a [Experience]) -> Vec<&'a Experience> {
        compose(experiences, self.filter, self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(id: &str, title: &str, players: u64, genre: Genre) -> Experience {
        Experience {
            id: id.into(),
            title: title.into(),
            creator: String::new(),
            creator_avatar_url: String::new(),
            thumbnail_url: String::new(),
            player_count: players,
            genre,
            description: String::new(),
        }
    }

    #[test]
    fn test_format_player_count() {
        assert_eq!(format_player_count(1_234_567), "1.2M");
        assert_eq!(format_player_count(45_200), "45.2K");
        assert_eq!(format_player_count(950), "950");
        assert_eq!(format_player_count(1_000), "1.0K");
    }

    #[test]
    fn test_newest_puts_non_numeric_last() {
        let list = [
            exp("user-1", "Custom", 1, Genre::Obby),
            exp("2", "Two", 1, Genre::Obby),
            exp("10", "Ten", 1, Genre::Obby),
        ];
        let ids: Vec<_> = compose(&list, GenreFilter::All, SortOrder::Newest)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, ["10", "2", "user-1"]);
    }

    #[test]
    fn test_az_ignores_case() {
        let list = [
            exp("1", "zeta", 1, Genre::Obby),
            exp("2", "Alpha", 1, Genre::Obby),
            exp("3", "beta", 1, Genre::Obby),
        ];
        let titles: Vec<_> = compose(&list, GenreFilter::All, SortOrder::AZ)
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, ["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_filter_options_order() {
        let labels: Vec<_> = GenreFilter::options().map(|f| f.label()).collect();
        assert_eq!(labels[0], "All");
        assert_eq!(labels.len(), 7);
    }

    fn ids<'a>(shown: &[&'a Experience]) -> Vec<&'a str> {
        shown.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_popular_orders_by_player_count() {
        let list = [
            exp("1", "One", 10, Genre::Obby),
            exp("2", "Two", 50, Genre::Obby),
        ];
        assert_eq!(ids(&compose(&list, GenreFilter::All, SortOrder::Popular)), ["2", "1"]);
    }

    #[test]
    fn test_az_orders_titles() {
        let list = [
            exp("1", "Banana", 1, Genre::Obby),
            exp("2", "Apple", 1, Genre::Obby),
        ];
        let shown = compose(&list, GenreFilter::All, SortOrder::AZ);
        let titles: Vec<_> = shown.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Apple", "Banana"]);
    }

    #[test]
    fn test_filter_keeps_relative_order() {
        let list = [
            exp("1", "Kart", 5, Genre::Racing),
            exp("2", "Quest", 90, Genre::Adventure),
            exp("3", "Drift", 80, Genre::Racing),
            exp("4", "Rally", 1, Genre::Racing),
        ];
        let racing = GenreFilter::Only(Genre::Racing);
        // Equal counts leave only the filter at work
        let same_count: Vec<_> = list
            .iter()
            .map(|e| Experience {
                player_count: 7,
                ..e.clone()
            })
            .collect();
        assert_eq!(ids(&compose(&same_count, racing, SortOrder::Popular)), ["1", "3", "4"]);
        assert_eq!(ids(&compose(&list, racing, SortOrder::Popular)), ["3", "1", "4"]);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let list = [
            exp("5", "Speedway", 300, Genre::Racing),
            exp("9", "Circuit", 300, Genre::Racing),
            exp("2", "Boost", 900, Genre::Racing),
            exp("7", "Apex", 300, Genre::Racing),
        ];
        assert_eq!(
            ids(&compose(&list, GenreFilter::All, SortOrder::Popular)),
            ["2", "5", "9", "7"]
        );

        let reversed: Vec<Experience> = list.iter().rev().cloned().collect();
        assert_eq!(
            ids(&compose(&reversed, GenreFilter::All, SortOrder::Popular)),
            ["2", "7", "9", "5"]
        );

        let named = [
            exp("1", "Orbit", 1, Genre::Obby),
            exp("2", "orbit", 1, Genre::Obby),
            exp("3", "Orbit", 1, Genre::Obby),
        ];
        // Exact title breaks the case-insensitive tie; identical titles stay put
        assert_eq!(ids(&compose(&named, GenreFilter::All, SortOrder::AZ)), ["1", "3", "2"]);
    }
}
