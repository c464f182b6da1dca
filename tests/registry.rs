use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use kstring::KString;

use mock_datasets::{
    config::MockConfig,
    config_file::ConfigBackend,
    date_and_time::TimeWindow,
    error::{LookupKind, MockDataError},
    registry::{GenerationOptions, MetricId, Registry},
    table::{ColumnType, RowKey},
};

const HOUR: i64 = 3600 * 1000;

fn utc_millis(y: i32, m: u32, d: u32, h: u32) -> i64 {
    Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap(),
    )
    .timestamp_millis()
}

fn options(start: i64, end: i64, seed: Option<u64>) -> Result<GenerationOptions> {
    Ok(GenerationOptions {
        window: TimeWindow::from_millis(start, end)?,
        seed,
    })
}

fn two_regions(timezone: &str) -> Result<MockConfig> {
    ConfigBackend::Json5.parse_str(&format!(
        r#"{{
            datasets: {{
                d1: {{
                    timezone: "{timezone}",
                    dimensions: ["region"],
                    granularity: "1hour",
                    metrics: {{
                        m1: {{
                            us: {{ mean: 10, std: 0 }},
                            eu: {{ mean: 20, std: 0 }},
                        }},
                    }},
                }},
            }},
        }}"#
    ))
}

fn key(time: i64, region: &str) -> RowKey {
    RowKey {
        time,
        dimensions: vec![KString::from_ref(region)],
    }
}

#[test]
fn t_two_hours_two_regions() -> Result<()> {
    for timezone in ["UTC", "America/Los_Angeles", "Europe/Zurich"] {
        let t0 = utc_millis(2024, 3, 5, 10);
        let t1 = t0 + HOUR;
        let registry = Registry::build(&two_regions(timezone)?, &options(t0, t0 + 2 * HOUR, None)?)?;
        let table = registry.resolve("d1")?;
        let rows: Vec<(i64, &str, Option<f64>)> = table
            .rows()
            .iter()
            .map(|row| (row.key.time, row.key.dimensions[0].as_str(), row.val[0]))
            .collect();
        assert_eq!(
            rows,
            [
                (t0, "eu", Some(20.)),
                (t0, "us", Some(10.)),
                (t1, "eu", Some(20.)),
                (t1, "us", Some(10.)),
            ],
            "{timezone}"
        );
        assert_eq!(table.get(&key(t1, "us"), "m1"), Some(Some(10.)));
        assert_eq!(registry.max_time("d1")?, Some(t1));
    }
    Ok(())
}

#[test]
fn t_schema() -> Result<()> {
    let config: MockConfig = ConfigBackend::Yaml.parse_str(
        "
datasets:
  sales:
    timezone: UTC
    dimensions: [region, channel]
    metrics:
      revenue:
        us: { web: { mean: 100, std: 5 }, store: { mean: 50 } }
        eu: { web: { mean: 80 } }
      orders:
        us: { web: { mean: 10 } }
",
    )?;
    let registry = Registry::build(&config, &options(0, 24 * HOUR, Some(3))?)?;
    let table = registry.resolve("sales")?;
    let schema: Vec<(String, ColumnType)> = table
        .schema()
        .into_iter()
        .map(|(name, ty)| (name.into_owned(), ty))
        .collect();
    assert_eq!(
        schema,
        [
            ("time".to_string(), ColumnType::Long),
            ("region".to_string(), ColumnType::String),
            ("channel".to_string(), ColumnType::String),
            ("orders".to_string(), ColumnType::Double),
            ("revenue".to_string(), ColumnType::Double),
        ]
    );
    // 3 leaves of revenue, orders' only leaf is one of them
    assert_eq!(table.len(), 3 * 24);
    let orders = table.metric_column("orders").expect("declared");
    assert_eq!(orders.iter().filter(|v| v.is_some()).count(), 24);
    assert!(table
        .metric_column("revenue")
        .expect("declared")
        .iter()
        .all(|v| matches!(v, Some(v) if *v >= 0.)));

    let filters = registry.dimension_filters("sales")?;
    let values = |d: &str| -> Vec<&str> {
        filters[&KString::from_ref(d)]
            .iter()
            .map(|v| v.as_str())
            .collect()
    };
    assert_eq!(values("region"), ["eu", "us"]);
    assert_eq!(values("channel"), ["store", "web"]);
    Ok(())
}

#[test]
fn t_metric_ids_across_datasets() -> Result<()> {
    let config: MockConfig = ConfigBackend::Json5.parse_str(
        r#"{
            datasets: {
                zeta: { metrics: { b: {}, a: {} } },
                alpha: { metrics: { z: {}, y: {} } },
                mid: { metrics: {} },
            },
        }"#,
    )?;
    let registry = Registry::build(&config, &options(0, 3 * HOUR, None)?)?;
    assert_eq!(registry.list_datasets(), ["alpha", "mid", "zeta"]);
    let ids: Vec<(u64, String)> = registry
        .metric_ids()
        .map(|(id, r)| (id.0, r.to_string()))
        .collect();
    assert_eq!(
        ids,
        [
            (1, "alpha/y".to_string()),
            (2, "alpha/z".to_string()),
            (3, "zeta/a".to_string()),
            (4, "zeta/b".to_string()),
        ]
    );
    assert_eq!(registry.metric_name(MetricId(3))?, "a");
    assert_eq!(registry.metric_id("zeta", "b")?, MetricId(4));
    assert!(registry.resolve("mid")?.is_empty());
    assert_eq!(registry.max_time("mid")?, None);
    Ok(())
}

#[test]
fn t_lookup_misses() -> Result<()> {
    let registry = Registry::build(&two_regions("UTC")?, &options(0, HOUR, None)?)?;
    assert_eq!(
        registry.resolve("d2").err(),
        Some(MockDataError::NotFound {
            kind: LookupKind::Dataset,
            name: "d2".into()
        })
    );
    assert!(registry
        .metric_name(MetricId(2))
        .is_err_and(|e| e.is_lookup_miss()));
    assert!(registry.metric_id("d1", "m2").is_err());
    assert!(registry.dimension_filters("nope").is_err());
    Ok(())
}

#[test]
fn t_unseeded_runs_have_same_structure() -> Result<()> {
    let config: MockConfig = ConfigBackend::Yaml.parse_str(
        "
datasets:
  d:
    dimensions: [region]
    granularity: 15 minutes
    metrics:
      a: { us: { mean: 5, std: 3 }, eu: { mean: 1, std: 1 } }
      b: { apac: { mean: 50, std: 20 } }
",
    )?;
    let opts = options(utc_millis(2024, 1, 1, 0), utc_millis(2024, 1, 3, 0), None)?;
    let r1 = Registry::build(&config, &opts)?;
    let r2 = Registry::build(&config, &opts)?;
    let (t1, t2) = (r1.resolve("d")?, r2.resolve("d")?);
    assert_eq!(t1.len(), 3 * 2 * 24 * 4);
    assert_eq!(t1.len(), t2.len());
    assert!(t1.times().eq(t2.times()));
    assert_eq!(t1.dimension_column("region"), t2.dimension_column("region"));
    let present = |t: &mock_datasets::table::DatasetTable, m: &str| -> Vec<bool> {
        t.metric_column(m)
            .expect("declared")
            .iter()
            .map(Option::is_some)
            .collect()
    };
    assert_eq!(present(t1, "a"), present(t2, "a"));
    assert_eq!(present(t1, "b"), present(t2, "b"));
    Ok(())
}

#[test]
fn t_seeded_runs_are_identical() -> Result<()> {
    let mut config = two_regions("America/Los_Angeles")?;
    config.seed = Some(99);
    if let Some(d1) = config.datasets.get_mut("d1") {
        d1.metrics = Some(serde_json::json!({
            "m1": { "us": { "mean": 10, "std": 4 }, "eu": { "mean": 20, "std": 8 } },
            "m2": { "us": { "mean": 2, "std": 2 } },
        }));
    }
    let now = Utc.timestamp_millis_opt(utc_millis(2024, 6, 1, 12)).unwrap();
    let opts = GenerationOptions::from_config(&config, now)?;
    assert_eq!(opts.seed, Some(99));
    assert_eq!(opts.window.end_millis() - opts.window.start_millis(), 28 * 24 * HOUR);

    let r1 = Registry::build(&config, &opts)?;
    let r2 = Registry::build(&config, &opts)?;
    assert_eq!(r1.resolve("d1")?, r2.resolve("d1")?);

    let other = GenerationOptions {
        seed: Some(100),
        ..opts
    };
    let r3 = Registry::build(&config, &other)?;
    assert_ne!(r1.resolve("d1")?, r3.resolve("d1")?);
    Ok(())
}

#[test]
fn t_missing_metrics_aborts() -> Result<()> {
    let config: MockConfig = ConfigBackend::Json5.parse_str(
        r#"{ datasets: { d1: { metrics: { m: {} } }, d2: { dimensions: ["x"] } } }"#,
    )?;
    match Registry::build(&config, &options(0, HOUR, None)?) {
        Err(MockDataError::ConfigMalformed { context, reason: _ }) => {
            assert_eq!(context, "d2/metrics")
        }
        other => panic!("expected ConfigMalformed, got {other:?}"),
    }
    Ok(())
}

#[test]
fn t_config_errors() -> Result<()> {
    let build = |yaml: &str| -> Result<Result<Registry, MockDataError>> {
        let config: MockConfig = ConfigBackend::Yaml.parse_str(yaml)?;
        Ok(Registry::build(&config, &options(0, HOUR, None)?))
    };
    assert_eq!(
        build("datasets: { d: { timezone: Nowhere/Town, metrics: {} } }")?.err(),
        Some(MockDataError::InvalidTimezone("Nowhere/Town".into()))
    );
    assert!(matches!(
        build("datasets: { d: { granularity: 0 hours, metrics: {} } }")?,
        Err(MockDataError::InvalidPeriod { .. })
    ));
    assert!(matches!(
        build("datasets: { d: { dimensions: [a, b], metrics: { m: { x: { mean: 1 } } } } }")?,
        Err(MockDataError::ConfigMalformed { .. })
    ));
    assert!(matches!(
        build("datasets: { d: { metrics: { m: { std: -2 } } } }")?,
        Err(MockDataError::ConfigMalformed { .. })
    ));
    Ok(())
}

#[test]
fn t_hcl_config() -> Result<()> {
    let config: MockConfig = ConfigBackend::Hcl.parse_str(
        r#"
seed = 5
datasets = {
  d1 = {
    timezone = "UTC"
    dimensions = ["region"]
    granularity = "1day"
    metrics = {
      m1 = {
        us = { mean = 3, std = 0 }
      }
    }
  }
}
"#,
    )?;
    let registry = Registry::build(
        &config,
        &options(utc_millis(2024, 1, 1, 0), utc_millis(2024, 1, 8, 0), config.seed)?,
    )?;
    let table = registry.resolve("d1")?;
    assert_eq!(table.len(), 7);
    assert!(table
        .metric_column("m1")
        .expect("declared")
        .iter()
        .all(|v| *v == Some(3.)));
    Ok(())
}

#[test]
fn t_metric_without_leaves_is_null_column() -> Result<()> {
    let config: MockConfig = ConfigBackend::Json5.parse_str(
        r#"{
            datasets: {
                d: {
                    timezone: "UTC",
                    dimensions: ["region"],
                    metrics: { a: { us: { mean: 4, std: 0 } }, b: {} },
                },
            },
        }"#,
    )?;
    let registry = Registry::build(&config, &options(0, 3 * HOUR, None)?)?;
    let table = registry.resolve("d")?;
    assert_eq!(table.len(), 3);
    assert!(table
        .metric_column("a")
        .expect("declared")
        .iter()
        .all(|v| *v == Some(4.)));
    assert!(table
        .metric_column("b")
        .expect("declared")
        .iter()
        .all(Option::is_none));
    assert_eq!(registry.metric_id("d", "b")?, MetricId(2));
    Ok(())
}
