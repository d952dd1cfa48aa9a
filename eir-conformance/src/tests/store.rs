//! Decision-engine scenarios bound over the HTTP façade: the "direct call"
//! half of the conformance matrix (S1-S7, P4, P8, P9, and the removal
//! round trips), as opposed to `tests::diameter`'s wire-level S8/S9.
//!
//! Every test picks TAC/IMEI values from its own disjoint namespace so
//! tests can run concurrently against one shared, never-reset store.

use anyhow::ensure;
use libtest_mimic::Trial;

use crate::context::{ctx, run};

pub fn register() -> Vec<Trial> {
    vec![
        Trial::test("store::s1_single_point_range_matches_exactly", || {
            run(async {
                let http = &ctx().http;
                let status = http.insert_tac("90000001", Some("90000001"), "black").await?;
                ensure!(status == 201, "insert_tac returned {status}");

                let (_, body) = http.check_tac("90000001").await?;
                let body = body.expect("check_tac returned no body");
                ensure!(body.status == "BLACKLISTED", "expected BLACKLISTED, got {}", body.status);
                Ok(())
            })
        }),
        Trial::test("store::s2_range_match_inside_bounds", || {
            run(async {
                let http = &ctx().http;
                let status = http.insert_tac("90010000", Some("90019999"), "white").await?;
                ensure!(status == 201, "insert_tac returned {status}");

                let (_, body) = http.check_tac("90015000").await?;
                let body = body.expect("check_tac returned no body");
                ensure!(body.status == "WHITELISTED", "expected WHITELISTED, got {}", body.status);
                Ok(())
            })
        }),
        Trial::test("store::s3_no_match_defaults_to_whitelisted", || {
            run(async {
                // A TAC with no stored range takes the operator default
                // (default_policy_unknown_is_whitelisted=true), so the
                // façade answers 200/WHITELISTED rather than surfacing the
                // underlying `unknown` error.
                let (status, body) = ctx().http.check_tac("90029999").await?;
                ensure!(status == 200, "expected 200, got {status}");
                let body = body.expect("check_tac returned no body");
                ensure!(body.status == "WHITELISTED", "expected WHITELISTED, got {}", body.status);
                Ok(())
            })
        }),
        Trial::test("store::s4_s5_child_wins_then_parent_catches", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("90030000", Some("90030005"), "black").await? == 201,
                    "parent insert_tac failed"
                );
                ensure!(
                    http.insert_tac("90030000", Some("90030009"), "grey").await? == 201,
                    "child insert_tac failed"
                );

                let (_, inside_child) = http.check_tac("90030003").await?;
                let inside_child = inside_child.expect("no body");
                ensure!(
                    inside_child.status == "BLACKLISTED",
                    "expected child range to win inside its bounds, got {}",
                    inside_child.status
                );

                let (_, inside_parent_only) = http.check_tac("90030007").await?;
                let inside_parent_only = inside_parent_only.expect("no body");
                ensure!(
                    inside_parent_only.status == "GREYLISTED",
                    "expected parent range to catch past the child's end, got {}",
                    inside_parent_only.status
                );
                Ok(())
            })
        }),
        Trial::test("store::s6_partial_overlap_is_rejected", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("90040000", Some("90040009"), "white").await? == 201,
                    "first insert_tac failed"
                );
                let status = http.insert_tac("90039998", Some("90040000"), "white").await?;
                ensure!(status == 400, "expected 400 for partial overlap, got {status}");
                Ok(())
            })
        }),
        Trial::test("store::s7_duplicate_imei_is_rejected", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_imei("90050000000001", "g").await? == 201,
                    "first insert_imei failed"
                );
                let status = http.insert_imei("90050000000001", "g").await?;
                ensure!(status == 400, "expected 400 for duplicate IMEI, got {status}");
                Ok(())
            })
        }),
        Trial::test("store::p4_duplicate_tac_key_leaves_store_unchanged", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("90060000", Some("90060000"), "black").await? == 201,
                    "first insert_tac failed"
                );
                let status = http.insert_tac("90060000", Some("90060000"), "white").await?;
                ensure!(status == 400, "expected 400 on duplicate key, got {status}");

                let (_, body) = http.check_tac("90060000").await?;
                let body = body.expect("no body");
                ensure!(
                    body.status == "BLACKLISTED",
                    "store mutated by a rejected duplicate insert: got {}",
                    body.status
                );
                Ok(())
            })
        }),
        Trial::test("store::p9_insert_then_check_imei_round_trips", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_imei("90070000000001", "w").await? == 201,
                    "insert_imei failed"
                );
                let (_, body) = http.check_imei("90070000000001").await?;
                let body = body.expect("no body");
                ensure!(body.status == "WHITELISTED", "expected WHITELISTED, got {}", body.status);
                Ok(())
            })
        }),
        Trial::test("store::remove_tac_then_check_returns_to_default", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("90080000", Some("90080000"), "black").await? == 201,
                    "insert_tac failed"
                );
                let (_, before) = http.check_tac("90080000").await?;
                ensure!(
                    before.expect("no body").status == "BLACKLISTED",
                    "range not visible before removal"
                );

                let status = http.remove_tac("90080000").await?;
                ensure!(status == 204, "expected 204 from remove_tac, got {status}");

                let (status, after) = http.check_tac("90080000").await?;
                ensure!(status == 200, "expected 200 after removal, got {status}");
                ensure!(
                    after.expect("no body").status == "WHITELISTED",
                    "removed range still affecting check_tac"
                );
                Ok(())
            })
        }),
        Trial::test("store::remove_imei_then_check_returns_to_default", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_imei("90090000000001", "b").await? == 201,
                    "insert_imei failed"
                );
                let status = http.remove_imei("90090000000001").await?;
                ensure!(status == 204, "expected 204 from remove_imei, got {status}");

                let (status, body) = http.check_imei("90090000000001").await?;
                ensure!(status == 200, "expected 200 after removal, got {status}");
                ensure!(
                    body.expect("no body").status == "WHITELISTED",
                    "removed IMEI still affecting check_imei"
                );
                Ok(())
            })
        }),
        Trial::test("store::list_tac_includes_inserted_range", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("90100000", Some("90100000"), "black").await? == 201,
                    "insert_tac failed"
                );
                let ranges = http.list_tac().await?;
                ensure!(
                    ranges.iter().any(|r| r.key.trim() == "90100000" || r.key.contains("90100000")),
                    "list_tac did not include the inserted key"
                );
                Ok(())
            })
        }),
    ]
}
