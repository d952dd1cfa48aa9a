//! Façade-level scenarios: `/health`, the 5G `equipment-status` endpoint,
//! and the RFC 7807 problem-details shape on a rejected `insert-tac`.

use anyhow::ensure;
use libtest_mimic::Trial;

use crate::context::{ctx, run};

pub fn register() -> Vec<Trial> {
    vec![
        Trial::test("http::health_reports_200", || {
            run(async {
                let status = ctx().http.health().await?;
                ensure!(status == 200, "expected 200, got {status}");
                Ok(())
            })
        }),
        Trial::test("http::equipment_status_matches_stored_range", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("91000000", Some("91000000"), "black").await? == 201,
                    "insert_tac failed"
                );
                let (status, body) = http.equipment_status("91000000").await?;
                ensure!(status == 200, "expected 200, got {status}");
                ensure!(
                    body.expect("no body").status == "BLACKLISTED",
                    "equipment-status did not reflect the stored range"
                );
                Ok(())
            })
        }),
        Trial::test("http::insert_tac_rejects_unknown_color_as_400", || {
            run(async {
                let status = ctx().http.insert_tac("91010000", Some("91010000"), "purple").await?;
                ensure!(status == 400, "expected 400 for an invalid color, got {status}");
                Ok(())
            })
        }),
        Trial::test("http::rejected_insert_returns_problem_details_body", || {
            run(async {
                let http = &ctx().http;
                ensure!(
                    http.insert_tac("91020000", Some("91020000"), "black").await? == 201,
                    "first insert_tac failed"
                );
                let (status, problem) = http.insert_tac_raw("91020000", Some("91020000"), "white").await?;
                ensure!(status == 400, "expected 400 on duplicate key, got {status}");
                ensure!(problem.status == 400, "problem body status field is {}", problem.status);
                Ok(())
            })
        }),
        Trial::test("http::check_tac_and_check_imei_agree_on_whitelisted_default", || {
            run(async {
                let http = &ctx().http;
                let (tac_status, tac_body) = http.check_tac("91030000").await?;
                let (imei_status, imei_body) = http.check_imei("91030000000009").await?;
                ensure!(tac_status == 200 && imei_status == 200, "expected 200/200");
                ensure!(
                    tac_body.expect("no body").status == "WHITELISTED",
                    "check-tac default mismatch"
                );
                ensure!(
                    imei_body.expect("no body").status == "WHITELISTED",
                    "check-imei default mismatch"
                );
                Ok(())
            })
        }),
    ]
}
