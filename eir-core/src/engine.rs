//! The Decision Engine: CheckTac, CheckImei, InsertTac, InsertImei, and the
//! admin removal operations implied by the Range Store's stated lifecycle.

use std::sync::Arc;

use thiserror::Error;

use crate::colour::Colour;
use crate::config::EngineConfig;
use crate::range::{ANY_SUFFIX, ImeiEntry, TacRange, fit, make_key, search_key};
use crate::store::{RangeRepository, StoreError};

/// A system-load snapshot passed on every decision call. Overloaded load
/// forces a refusal before any store access happens.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemLoad {
    pub overload_level: i32,
    pub tps_overload: bool,
}

impl SystemLoad {
    pub fn nominal() -> Self {
        Self::default()
    }

    pub fn is_overloaded(&self) -> bool {
        self.tps_overload || self.overload_level > 0
    }
}

/// The error taxonomy of §7. `Overload` and `Unknown` double as the
/// "colour" the caller should answer with when a boundary (S13, HTTP) needs
/// one; see `DecisionError::colour_name`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("overload")]
    Overload,
    #[error("unknown")]
    Unknown,
    #[error("invalid_parameter")]
    InvalidParameter,
    #[error("invalid_value")]
    InvalidValue,
    #[error("invalid_length")]
    InvalidLength,
    #[error("invalid_color")]
    InvalidColor,
    #[error("color_conflict")]
    ColorConflict,
    #[error("imei_exist")]
    ImeiExist,
    #[error("range_exist")]
    RangeExist,
    #[error("not_found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DecisionError {
    /// The code this error should be reported under at the HTTP/Diameter
    /// boundary, matching §7's table verbatim.
    pub fn code(&self) -> &'static str {
        match self {
            DecisionError::Overload => "overload",
            DecisionError::Unknown => "unknown",
            DecisionError::InvalidParameter => "invalid_parameter",
            DecisionError::InvalidValue => "invalid_value",
            DecisionError::InvalidLength => "invalid_length",
            DecisionError::InvalidColor => "invalid_color",
            DecisionError::ColorConflict => "color_conflict",
            DecisionError::ImeiExist => "imei_exist",
            DecisionError::RangeExist => "range_exist",
            DecisionError::NotFound => "not_found",
            DecisionError::Store(_) => "store_error",
        }
    }
}

/// The successful outcome of `check_tac`/`check_imei`.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub colour: Colour,
    /// The TAC range that matched, when the verdict came from the range
    /// store rather than the IMEI-prefix store.
    pub matched: Option<TacRange>,
}

fn validate_digits(imei: &[u8]) -> Result<(), DecisionError> {
    if imei.is_empty() || !imei.iter().all(u8::is_ascii_digit) {
        return Err(DecisionError::InvalidValue);
    }
    Ok(())
}

/// Split raw IMEI digits into the fixed-width `start` prefix and the
/// remainder `end` suffix, exactly as InsertImei/CheckImei require.
fn split_imei(imei: &[u8], check_length: usize) -> (Vec<u8>, Vec<u8>) {
    let start = fit(imei, check_length, b' ');
    let end = if imei.len() > check_length {
        imei[check_length..].to_vec()
    } else {
        ANY_SUFFIX.to_vec()
    };
    (start, end)
}

/// `CheckTac`: normalise `imei`, consult the Range Store via the
/// previous-range-then-parent-chain algorithm, and return a verdict.
pub async fn check_tac(
    store: &dyn RangeRepository,
    cfg: &EngineConfig,
    imei: &[u8],
    load: SystemLoad,
) -> Result<CheckResult, DecisionError> {
    if load.is_overloaded() {
        return Err(DecisionError::Overload);
    }
    validate_digits(imei)?;

    let imei_norm = fit(imei, cfg.tac_max_length, b' ');
    let key = search_key(&imei_norm, cfg.tac_max_length);

    let mut cand = store.tac_prev(&key).await?;
    loop {
        let Some(range) = cand else {
            return Err(DecisionError::Unknown);
        };
        if range.end.as_slice() >= imei_norm.as_slice() {
            let narrowest = narrow_to_tightest_sibling(store, range, &imei_norm).await?;
            return Ok(CheckResult {
                colour: narrowest.colour,
                matched: Some(narrowest),
            });
        }
        cand = match &range.prev_link {
            Some(link) => store.tac_lookup(link).await?,
            None => None,
        };
    }
}

/// Ranges sharing a `start` sort contiguously by `end`, so `tac_prev` lands
/// on the widest member of such a cluster first. Walk its raw key-order
/// predecessors to prefer a narrower sibling that still contains
/// `imei_norm` (containment trumps siblings: the narrowest match wins).
async fn narrow_to_tightest_sibling(
    store: &dyn RangeRepository,
    mut range: TacRange,
    imei_norm: &[u8],
) -> Result<TacRange, StoreError> {
    while let Some(sibling) = store.tac_prev(&range.key).await? {
        if sibling.start != range.start || sibling.end.as_slice() < imei_norm {
            break;
        }
        range = sibling;
    }
    Ok(range)
}

/// `CheckImei`: the exact-prefix variant over the IMEI-prefix store.
pub async fn check_imei(
    store: &dyn RangeRepository,
    cfg: &EngineConfig,
    imei: &[u8],
    load: SystemLoad,
) -> Result<CheckResult, DecisionError> {
    if load.is_overloaded() {
        return Err(DecisionError::Overload);
    }
    validate_digits(imei)?;

    let (start, end) = split_imei(imei, cfg.imei_check_length);
    let entry = store.imei_lookup(&start).await?;
    match entry {
        Some(entry) if entry.has_suffix(&end) || entry.has_suffix(ANY_SUFFIX) => Ok(CheckResult {
            colour: entry.colour,
            matched: None,
        }),
        _ => Err(DecisionError::Unknown),
    }
}

/// `InsertTac`: validate, normalise, resolve the parent link, relink any
/// now-contained siblings as children, then persist.
pub async fn insert_tac(
    store: &dyn RangeRepository,
    cfg: &EngineConfig,
    start: &[u8],
    end: Option<&[u8]>,
    colour: Colour,
) -> Result<(), DecisionError> {
    let w = cfg.tac_max_length;
    if start.is_empty() || start.len() > w || end.map(|e| e.len() > w).unwrap_or(false) {
        return Err(DecisionError::InvalidLength);
    }

    let new_start = fit(start, w, b' ');
    let new_end = match end {
        Some(e) => fit(e, w, 0xFF),
        None => new_start.clone(),
    };
    if new_end < new_start {
        return Err(DecisionError::InvalidValue);
    }
    let new_key = make_key(&new_start, &new_end);

    if store.tac_lookup(&new_key).await?.is_some() {
        return Err(DecisionError::RangeExist);
    }

    let new_range = TacRange::new(new_start.clone(), new_end.clone(), colour, None);

    // Parent-link resolution: first candidate from tac_prev, subsequent
    // candidates by following prev_link via tac_lookup. A candidate that
    // *contains* the new range is its parent; a candidate *contained by*
    // the new range (same-start, narrower `end`, so it sorts as a `tac_prev`
    // predecessor rather than a `tac_next` successor) instead becomes the
    // new range's child, and the search for the new range's own parent
    // continues past it via its pre-rewrite prev_link.
    let mut final_prev: Option<Vec<u8>> = None;
    let mut to_relink = Vec::new();
    let mut cursor = store.tac_prev(&new_key).await?;
    loop {
        let Some(cur) = cursor else { break };
        if cur.contains(&new_range) {
            final_prev = Some(cur.key.clone());
            break;
        } else if new_range.contains(&cur) {
            let old_prev_link = cur.prev_link.clone();
            let mut child = cur;
            child.prev_link = Some(new_key.clone());
            to_relink.push(child);
            cursor = match old_prev_link {
                Some(link) => store.tac_lookup(&link).await?,
                None => None,
            };
        } else if cur.is_strict_left_of(&new_start) {
            final_prev = Some(cur.key.clone());
            match &cur.prev_link {
                Some(link) => {
                    cursor = store.tac_lookup(link).await?;
                    continue;
                }
                None => break,
            }
        } else {
            return Err(DecisionError::RangeExist);
        }
    }

    // Child relink: successors strictly contained in the new range become
    // its children too.
    let mut next_cursor = new_key.clone();
    loop {
        let Some(mut nxt) = store.tac_next(&next_cursor).await? else {
            break;
        };
        if new_range.contains(&nxt) {
            next_cursor = nxt.key.clone();
            nxt.prev_link = Some(new_key.clone());
            to_relink.push(nxt);
        } else {
            break;
        }
    }

    for sibling in to_relink {
        store.tac_save(sibling).await?;
    }

    let mut final_range = new_range;
    final_range.prev_link = final_prev;
    store.tac_save(final_range).await?;
    Ok(())
}

/// `InsertImei`: validate, split, then append or create the matching entry.
pub async fn insert_imei(
    store: &dyn RangeRepository,
    cfg: &EngineConfig,
    imei: &[u8],
    colour: Colour,
) -> Result<(), DecisionError> {
    if imei.is_empty() {
        return Err(DecisionError::InvalidParameter);
    }
    if !imei.iter().all(u8::is_ascii_digit) {
        return Err(DecisionError::InvalidValue);
    }
    if imei.len() > cfg.imei_max_length {
        return Err(DecisionError::InvalidLength);
    }

    let (start, end) = split_imei(imei, cfg.imei_check_length);
    match store.imei_lookup(&start).await? {
        Some(mut entry) => {
            if entry.colour != colour {
                return Err(DecisionError::ColorConflict);
            }
            if entry.has_suffix(&end) {
                return Err(DecisionError::ImeiExist);
            }
            entry.add_suffix(end);
            store.imei_save(entry).await?;
        }
        None => {
            store
                .imei_save(ImeiEntry::new(start, end, colour))
                .await?;
        }
    }
    Ok(())
}

/// `RemoveTac`: the admin-provisioning counterpart to InsertTac implied by
/// the Range Store's stated lifecycle. Reattaches any children of the
/// removed range to its own parent so R2/R3 survive the removal.
pub async fn remove_tac(store: &dyn RangeRepository, key: &[u8]) -> Result<(), DecisionError> {
    let removed = store
        .tac_delete(key)
        .await?
        .ok_or(DecisionError::NotFound)?;

    for range in store.tac_list().await? {
        if range.prev_link.as_deref() == Some(key) {
            let mut updated = range;
            updated.prev_link = removed.prev_link.clone();
            store.tac_save(updated).await?;
        }
    }
    Ok(())
}

/// `RemoveImei`: the admin counterpart to InsertImei.
pub async fn remove_imei(
    store: &dyn RangeRepository,
    cfg: &EngineConfig,
    imei: &[u8],
) -> Result<(), DecisionError> {
    let (start, end) = split_imei(imei, cfg.imei_check_length);
    let mut entry = store
        .imei_lookup(&start)
        .await?
        .ok_or(DecisionError::NotFound)?;
    if !entry.remove_suffix(&end) {
        return Err(DecisionError::NotFound);
    }
    if entry.end_imeis.is_empty() {
        store.imei_delete(&start).await?;
    } else {
        store.imei_save(entry).await?;
    }
    Ok(())
}

/// Convenience wrapper bundling a repository handle with its engine
/// configuration, for callers (the S13 Handler, the HTTP façade) that would
/// otherwise thread both through every call.
#[derive(Clone)]
pub struct DecisionEngine<R: RangeRepository + ?Sized> {
    pub store: Arc<R>,
    pub config: EngineConfig,
}

impl<R: RangeRepository + ?Sized> DecisionEngine<R> {
    pub fn new(store: Arc<R>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub async fn check_tac(&self, imei: &[u8], load: SystemLoad) -> Result<CheckResult, DecisionError> {
        check_tac(self.store.as_ref(), &self.config, imei, load).await
    }

    pub async fn check_imei(&self, imei: &[u8], load: SystemLoad) -> Result<CheckResult, DecisionError> {
        check_imei(self.store.as_ref(), &self.config, imei, load).await
    }

    pub async fn insert_tac(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        colour: Colour,
    ) -> Result<(), DecisionError> {
        insert_tac(self.store.as_ref(), &self.config, start, end, colour).await
    }

    pub async fn insert_imei(&self, imei: &[u8], colour: Colour) -> Result<(), DecisionError> {
        insert_imei(self.store.as_ref(), &self.config, imei, colour).await
    }

    pub async fn remove_tac(&self, key: &[u8]) -> Result<(), DecisionError> {
        remove_tac(self.store.as_ref(), key).await
    }

    pub async fn remove_imei(&self, imei: &[u8]) -> Result<(), DecisionError> {
        remove_imei(self.store.as_ref(), &self.config, imei).await
    }

    pub async fn tac_list(&self) -> Result<Vec<TacRange>, StoreError> {
        self.store.tac_list().await
    }
}
