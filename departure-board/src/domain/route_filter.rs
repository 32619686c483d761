//! Route prefix filtering.
//!
//! Bus and ferry boards only show the routes an operator cares about,
//! selected by route-code prefix. Train boards show everything.

use super::{Mode, RawDeparture};

/// Inclusion rule for one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFilterRule {
    /// Every route at the stop passes.
    AllRoutes,
    /// Only routes whose code starts with one of these prefixes pass.
    /// Matching is case-sensitive and anchored at the start.
    Prefixes(Vec<String>),
}

impl RouteFilterRule {
    /// Does this rule admit the given route code?
    pub fn admits(&self, route_code: &str) -> bool {
        match self {
            RouteFilterRule::AllRoutes => true,
            RouteFilterRule::Prefixes(prefixes) => {
                prefixes.iter().any(|p| route_code.starts_with(p.as_str()))
            }
        }
    }
}

/// Keep only the departures the rule admits, preserving input order.
///
/// An empty result is a valid board with nothing to show.
pub fn apply(rule: &RouteFilterRule, departures: Vec<RawDeparture>) -> Vec<RawDeparture> {
    match rule {
        RouteFilterRule::AllRoutes => departures,
        RouteFilterRule::Prefixes(_) => departures
            .into_iter()
            .filter(|d| rule.admits(&d.route_code))
            .collect(),
    }
}

/// Per-mode route prefix lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRules {
    pub bus_prefixes: Vec<String>,
    pub ferry_prefixes: Vec<String>,
}

impl RouteRules {
    pub fn new(bus_prefixes: Vec<String>, ferry_prefixes: Vec<String>) -> Self {
        Self {
            bus_prefixes,
            ferry_prefixes,
        }
    }

    /// The rule a board of the given mode uses.
    ///
    /// Trains are never filtered. A bus or ferry board with no configured
    /// prefixes is not filtered either.
    pub fn rule_for(&self, mode: Mode) -> RouteFilterRule {
        let prefixes = match mode {
            Mode::Train => return RouteFilterRule::AllRoutes,
            Mode::Bus => &self.bus_prefixes,
            Mode::Ferry => &self.ferry_prefixes,
        };

        if prefixes.is_empty() {
            RouteFilterRule::AllRoutes
        } else {
            RouteFilterRule::Prefixes(prefixes.clone())
        }
    }
}

impl Default for RouteRules {
    /// Central Auckland bus routes and the downtown ferry services.
    fn default() -> Self {
        let bus = [
            "64-", "65-", "66-", "67-", "68-", "18-", "20-", "22-", "24-", "25-", "27-", "30-",
            "70-", "75-", "295-", "298-", "309-", "321-", "744-", "747-", "751-", "755-", "781-",
            "782-",
        ];
        let ferry = [
            "BAYS-", "BIRK-", "KPHS-", "KPHM-", "PINE-", "RAK-", "RANG-", "TIRI-", "WSTH-",
            "MTIA-", "HMB-",
        ];

        Self {
            bus_prefixes: bus.iter().map(|s| s.to_string()).collect(),
            ferry_prefixes: ferry.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw(route: &str) -> RawDeparture {
        RawDeparture {
            route_code: route.to_string(),
            scheduled_time: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
            predicted_time: None,
            destination: "Britomart".to_string(),
            trip_id: format!("trip-{route}"),
        }
    }

    fn routes(deps: &[RawDeparture]) -> Vec<&str> {
        deps.iter().map(|d| d.route_code.as_str()).collect()
    }

    #[test]
    fn prefix_filter_keeps_order() {
        let rule = RouteFilterRule::Prefixes(vec!["70".to_string(), "72".to_string()]);
        let input = vec![raw("70X"), raw("71"), raw("720"), raw("7")];

        let kept = apply(&rule, input);

        assert_eq!(routes(&kept), vec!["70X", "720"]);
    }

    #[test]
    fn prefix_is_case_sensitive() {
        let rule = RouteFilterRule::Prefixes(vec!["BAYS-".to_string()]);
        assert!(rule.admits("BAYS-209"));
        assert!(!rule.admits("bays-209"));
    }

    #[test]
    fn prefix_matches_only_at_start() {
        let rule = RouteFilterRule::Prefixes(vec!["70-".to_string()]);
        assert!(!rule.admits("170-201"));
        assert!(!rule.admits("X70-"));
    }

    #[test]
    fn all_routes_is_identity() {
        let input = vec![raw("EAST-201"), raw("STH-201"), raw("anything")];
        let kept = apply(&RouteFilterRule::AllRoutes, input.clone());
        assert_eq!(kept, input);
    }

    #[test]
    fn empty_result_is_valid() {
        let rule = RouteFilterRule::Prefixes(vec!["HMB-".to_string()]);
        assert!(apply(&rule, vec![raw("70-202"), raw("EAST-201")]).is_empty());
    }

    #[test]
    fn rules_per_mode() {
        let rules = RouteRules::default();
        assert_eq!(rules.rule_for(Mode::Train), RouteFilterRule::AllRoutes);
        assert!(rules.rule_for(Mode::Bus).admits("70-202"));
        assert!(!rules.rule_for(Mode::Bus).admits("BAYS-209"));
        assert!(rules.rule_for(Mode::Ferry).admits("BAYS-209"));
        assert!(!rules.rule_for(Mode::Ferry).admits("70-202"));
    }

    #[test]
    fn empty_prefix_list_admits_everything() {
        let rules = RouteRules::new(vec![], vec!["HMB-".to_string()]);
        assert_eq!(rules.rule_for(Mode::Bus), RouteFilterRule::AllRoutes);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn raw(route: String) -> RawDeparture {
        RawDeparture {
            trip_id: route.clone(),
            route_code: route,
            scheduled_time: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
            predicted_time: None,
            destination: String::new(),
        }
    }

    proptest! {
        /// Output is exactly the admitted subsequence of the input.
        #[test]
        fn output_is_admitted_subsequence(
            prefixes in proptest::collection::vec("[0-9A-Z]{1,3}", 1..4),
            codes in proptest::collection::vec("[0-9A-Z-]{0,6}", 0..20),
        ) {
            let rule = RouteFilterRule::Prefixes(prefixes.clone());
            let kept = apply(&rule, codes.iter().cloned().map(raw).collect());

            let expected: Vec<&String> = codes
                .iter()
                .filter(|c| prefixes.iter().any(|p| c.starts_with(p.as_str())))
                .collect();
            let actual: Vec<&String> = kept.iter().map(|d| &d.route_code).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
