//! Shared test utilities for integration tests
//!
//! Provides report fixtures in the shape of a Sponsored Products
//! search term export.

#![allow(dead_code)]

use assert_fs::prelude::*;

/// Header row of a typical search term export.
pub const SP_HEADER: &str = "Date,Campaign Name,Ad Group Name,Targeting,Match Type,Customer Search Term,Impressions,Clicks,Spend,7 Day Total Sales ,7 Day Total Orders (#)";

/// Write a report with the standard header plus `rows` (already comma-joined).
pub fn make_report(rows: &[&str]) -> (assert_fs::TempDir, std::path::PathBuf)
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    let mut body = String::from(SP_HEADER);
    body.push('\n');
    for row in rows
    {
        body.push_str(row);
        body.push('\n');
    }

    let report = tmp.child("search_terms.csv");
    report
        .write_str(&body)
        .expect("write report");

    let path = report
        .path()
        .to_path_buf();
    (tmp, path)
}

/// Two cannibalized terms and one isolated term.
///
/// - "red shoes": Camp A sells more (ROAS 2.0, 5 orders), Camp B is twice as
///   efficient (ROAS 4.0, 3 orders), split over two days for Camp A.
/// - "blue socks": both broad and exact in one campaign; exact leads both ways.
/// - "green hat": converts in one ad group only; the other placement has no orders.
pub fn make_standard_report() -> (assert_fs::TempDir, std::path::PathBuf)
{
    make_report(&[
        "2024-05-01,Camp A,AG 1,red shoes,BROAD,red shoes,100,10,20.00,40.00,2",
        "2024-05-02,Camp A,AG 1,red shoes,BROAD,red shoes,120,15,30.00,60.00,3",
        "2024-05-01,Camp B,AG 2,red shoes,EXACT,red shoes,80,5,10.00,40.00,3",
        "2024-05-01,Camp C,AG 3,socks,Exact,blue socks,50,4,8.00,48.00,4",
        "2024-05-01,Camp C,AG 4,socks,broad,blue socks,50,4,8.00,16.00,1",
        "2024-05-01,Camp D,AG 5,hats,PHRASE,green hat,30,3,6.00,30.00,2",
        "2024-05-01,Camp E,AG 6,-,-,green hat,30,3,6.00,,",
    ])
}
