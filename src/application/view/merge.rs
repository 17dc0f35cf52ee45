//! Merge view builder.
//!
//! Reconciles the universe catalog with the latest decision artifact into one
//! record per symbol. Universe rows seed the map; decision candidates then
//! overwrite, field by field, whatever they carry. Selected candidates are
//! applied after plain candidates, so a symbol that appears in both lists
//! ends with the selected record's values. Decision-only symbols are
//! synthesised from the decision fields alone.
//!
//! The result is a pure function of its inputs and is rebuilt from scratch
//! whenever either source partition changes.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde_json::Value;
use tracing::warn;

use crate::domain::candidate::{DecisionArtifact, UniverseRecord};
use crate::domain::id::Symbol;
use crate::domain::merged::MergedRecord;
use crate::error::Result;

/// Merged records keyed by uppercase symbol.
pub type MergedSymbols = BTreeMap<Symbol, MergedRecord>;

/// Merge `universe` with `decision`.
///
/// `None` means "never evaluated" and behaves like an artifact with no
/// candidates.
#[must_use]
pub fn build_merged_symbols(
    universe: &[UniverseRecord],
    decision: Option<&DecisionArtifact>,
) -> MergedSymbols {
    let mut merged: MergedSymbols = universe
        .iter()
        .filter(|record| !record.symbol.is_empty())
        .map(|record| (record.symbol.clone(), MergedRecord::from_universe(record)))
        .collect();

    let Some(decision) = decision else {
        return merged;
    };

    let evaluated = decision.candidates.iter().map(|c| (c, false));
    let selected = decision.selected().map(|c| (c, true));
    for (candidate, is_selected) in evaluated.chain(selected) {
        if candidate.symbol.is_empty() {
            continue;
        }
        let record = merged
            .entry(candidate.symbol.clone())
            .and_modify(|record| record.overlay(candidate))
            .or_insert_with(|| MergedRecord::from_candidate(candidate));
        record.selected |= is_selected;
    }

    merged
}

/// Decode the raw universe partition payload.
///
/// Accepts either a bare array or an object with a `symbols`/`items` array.
/// `null` decodes as an empty universe.
///
/// # Errors
///
/// Returns [`crate::error::Error::Json`] when the payload has another shape,
/// including an object that carries neither `symbols` nor `items`.
pub fn decode_universe(payload: &Value) -> Result<Vec<UniverseRecord>> {
    let rows = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => match map.get("symbols").or_else(|| map.get("items")) {
            Some(rows) => rows.clone(),
            None => {
                let keys: Vec<_> = map.keys().map(String::as_str).collect();
                warn!(keys = ?keys, "universe payload has no symbols or items array");
                return Err(serde_json::Error::custom(
                    "universe object has neither `symbols` nor `items`",
                )
                .into());
            }
        },
        other => other.clone(),
    };
    Ok(serde_json::from_value(rows)?)
}

/// Decode the raw decision partition payload. `null` decodes as `None`.
///
/// # Errors
///
/// Returns [`crate::error::Error::Json`] when the payload is not an artifact.
pub fn decode_decision(payload: &Value) -> Result<Option<DecisionArtifact>> {
    if payload.is_null() {
        return Ok(None);
    }
    serde_json::from_value(payload.clone())
        .map(Some)
        .map_err(|err| {
            warn!(error = %err, "decision payload did not decode");
            err.into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::{Band, Candidate};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn universe(symbol: &str, score: f64) -> UniverseRecord {
        let mut record = UniverseRecord::new(symbol);
        record.score = Some(score);
        record
    }

    fn artifact(candidates: Vec<Candidate>, selected: Vec<Candidate>) -> DecisionArtifact {
        DecisionArtifact {
            candidates,
            selected_candidates: selected,
            ..DecisionArtifact::default()
        }
    }

    #[test]
    fn decision_overwrites_only_fields_it_carries() {
        let mut spy = universe("SPY", 50.0);
        spy.price = Some(dec!(512.10));
        spy.verdict = Some("watch".into());

        let mut candidate = Candidate::new("SPY");
        candidate.score = Some(65.0);
        candidate.band = Some(Band::B);

        let merged = build_merged_symbols(&[spy], Some(&artifact(vec![candidate], vec![])));
        let record = &merged[&Symbol::new("SPY")];

        assert_eq!(record.score, Some(65.0));
        assert_eq!(record.band, Some(Band::B));
        assert_eq!(record.price, Some(dec!(512.10)));
        assert_eq!(record.verdict.as_deref(), Some("watch"));
        assert!(record.evaluated && !record.selected);
    }

    #[test]
    fn decision_only_symbol_is_synthesised() {
        let mut nvda = Candidate::new("nvda");
        nvda.score = Some(72.0);
        nvda.strategy = Some("cash_secured_put".into());

        let merged = build_merged_symbols(
            &[universe("SPY", 50.0)],
            Some(&artifact(vec![], vec![nvda])),
        );
        let record = &merged[&Symbol::new("NVDA")];

        assert_eq!(record.score, Some(72.0));
        assert_eq!(record.strategy.as_deref(), Some("cash_secured_put"));
        assert!(record.price.is_none() && record.market_cap.is_none());
        assert!(!record.in_universe && record.selected);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn selected_record_wins_over_plain_candidate() {
        let mut evaluated = Candidate::new("AAPL");
        evaluated.verdict = Some("skip".into());
        evaluated.score = Some(40.0);
        let mut chosen = Candidate::new("AAPL");
        chosen.verdict = Some("sell_put".into());

        let merged = build_merged_symbols(&[], Some(&artifact(vec![evaluated], vec![chosen])));
        let record = &merged[&Symbol::new("AAPL")];

        assert_eq!(record.verdict.as_deref(), Some("sell_put"));
        assert_eq!(record.score, Some(40.0));
        assert!(record.selected);
    }

    #[test]
    fn null_decision_equals_empty_decision() {
        let rows = vec![universe("SPY", 50.0), universe("QQQ", 44.0)];
        let empty = DecisionArtifact::default();
        assert_eq!(
            build_merged_symbols(&rows, None),
            build_merged_symbols(&rows, Some(&empty))
        );
    }

    #[test]
    fn empty_universe_yields_decision_symbols_only() {
        let merged = build_merged_symbols(
            &[],
            Some(&artifact(
                vec![Candidate::new("TSLA")],
                vec![Candidate::new("AMD")],
            )),
        );
        let symbols: Vec<_> = merged.keys().map(Symbol::as_str).collect();
        assert_eq!(symbols, vec!["AMD", "TSLA"]);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let rows = vec![universe("SPY", 50.0)];
        let mut candidate = Candidate::new("SPY");
        candidate.score = Some(90.0);
        let decision = artifact(vec![candidate], vec![]);
        let before = (rows.clone(), decision.clone());

        let first = build_merged_symbols(&rows, Some(&decision));
        let second = build_merged_symbols(&rows, Some(&decision));

        assert_eq!(first, second);
        assert_eq!((rows, decision), before);
    }

    #[test]
    fn decode_accepts_wrapped_and_bare_universe() {
        let bare = json!([{ "symbol": "spy", "score": 50 }]);
        let wrapped = json!({ "symbols": [{ "symbol": "SPY", "score": 50 }] });
        assert_eq!(decode_universe(&bare).unwrap(), decode_universe(&wrapped).unwrap());
        assert!(decode_universe(&Value::Null).unwrap().is_empty());
        assert!(decode_universe(&json!("nope")).is_err());
    }

    #[test]
    fn decode_rejects_object_without_rows() {
        let envelope = json!({ "error": "upstream timeout", "data": [{ "symbol": "SPY" }] });
        let err = decode_universe(&envelope).unwrap_err();
        assert!(matches!(err, crate::error::Error::Json(_)));
        assert!(err.to_string().contains("neither `symbols` nor `items`"));

        let items = json!({ "items": [{ "symbol": "QQQ" }] });
        assert_eq!(decode_universe(&items).unwrap().len(), 1);
        assert!(decode_universe(&json!({ "symbols": [] })).unwrap().is_empty());
    }

    #[test]
    fn decode_null_decision_is_none() {
        assert!(decode_decision(&Value::Null).unwrap().is_none());
        let artifact = decode_decision(&json!({ "candidates": [{ "symbol": "SPY" }] }))
            .unwrap()
            .unwrap();
        assert_eq!(artifact.candidates.len(), 1);
    }
}
