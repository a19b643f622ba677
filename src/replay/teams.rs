use std::collections::BTreeMap;

use super::raw::Sport;

/// Stats-API club ids keyed by lowercase club code.
const MLB_TEAMS: &[(&str, i64)] = &[
    ("ana", 108),
    ("ari", 109),
    ("bal", 110),
    ("bos", 111),
    ("chn", 112),
    ("cin", 113),
    ("cle", 114),
    ("col", 115),
    ("det", 116),
    ("hou", 117),
    ("kca", 118),
    ("lan", 119),
    ("was", 120),
    ("nyn", 121),
    ("oak", 133),
    ("pit", 134),
    ("sdn", 135),
    ("sea", 136),
    ("sfn", 137),
    ("sln", 138),
    ("tba", 139),
    ("tex", 140),
    ("tor", 141),
    ("min", 142),
    ("phi", 143),
    ("atl", 144),
    ("cha", 145),
    ("mia", 146),
    // pre-2012 code for the same club
    ("flo", 146),
    ("nya", 147),
    ("mil", 158),
];

const NHL_TEAMS: &[(&str, i64)] = &[
    ("njd", 1),
    ("nyi", 2),
    ("nyr", 3),
    ("phi", 4),
    ("pit", 5),
    ("bos", 6),
    ("buf", 7),
    ("mtl", 8),
    ("ott", 9),
    ("tor", 10),
    ("car", 12),
    ("fla", 13),
    ("tbl", 14),
    ("wsh", 15),
    ("chi", 16),
    ("det", 17),
    ("nsh", 18),
    ("stl", 19),
    ("cgy", 20),
    ("col", 21),
    ("edm", 22),
    ("van", 23),
    ("ana", 24),
    ("dal", 25),
    ("lak", 26),
    ("sjs", 28),
    ("cbj", 29),
    ("min", 30),
    ("wpg", 52),
    ("ari", 53),
    ("vgk", 54),
    ("sea", 55),
];

/// Immutable club-code → id table for one sport.
#[derive(Debug, Clone)]
pub struct TeamDirectory {
    sport: Sport,
    ids: BTreeMap<String, i64>,
}

impl TeamDirectory {
    pub fn new(sport: Sport, entries: &[(&str, i64)]) -> Self {
        TeamDirectory {
            sport,
            ids: entries
                .iter()
                .map(|(code, id)| (code.to_ascii_lowercase(), *id))
                .collect(),
        }
    }

    pub fn for_sport(sport: Sport) -> Self {
        match sport {
            Sport::Baseball => TeamDirectory::new(sport, MLB_TEAMS),
            Sport::Hockey => TeamDirectory::new(sport, NHL_TEAMS),
        }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    /// Case-insensitive lookup.
    pub fn id(&self, code: &str) -> Option<i64> {
        self.ids.get(&code.trim().to_ascii_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_per_sport() {
        let mlb = TeamDirectory::for_sport(Sport::Baseball);
        let nhl = TeamDirectory::for_sport(Sport::Hockey);
        assert_eq!(mlb.id("pit"), Some(134));
        assert_eq!(nhl.id("PIT"), Some(5));
        assert_eq!(mlb.sport(), Sport::Baseball);
    }

    #[test]
    fn test_legacy_code_shares_id() {
        let mlb = TeamDirectory::for_sport(Sport::Baseball);
        assert_eq!(mlb.id("flo"), mlb.id("mia"));
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(TeamDirectory::for_sport(Sport::Hockey).id("xyz"), None);
    }
}
