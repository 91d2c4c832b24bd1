//! End-to-end currency handling: settings, cached currency codes, deflation
//! tables from disk, and parameter conversion.

use approx::assert_relative_eq;
use std::io::Write;
use std::sync::Arc;
use technologydata_core::config::Settings;
use technologydata_core::currency::{
    BundledCountryData, CurrencyResolver, DeflationSource, TableDeflator, CURRENCY_CODES_FILE,
};
use technologydata_core::parameter::Parameter;
use technologydata_core::units::UnitContext;
use technologydata_core::TechDataError;

const TABLES: &str = r#"{
    "worldbank": {
        "deflators": {
            "DEU": {"2015": 100.0, "2020": 110.0, "2023": 125.0},
            "USA": {"2015": 100.0, "2020": 108.0}
        },
        "exchange_rates": {
            "DEU": {"2015": 0.9, "2020": 0.88, "2023": 0.92}
        }
    }
}"#;

struct Fixture {
    settings: Settings,
    ctx: UnitContext,
    resolver: CurrencyResolver,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    fixture_with("")
}

/// `extra` is appended to the settings file.
fn fixture_with(extra: &str) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::from_toml_str(&format!(
        "reference_currency = \"EUR_2020\"\ncache_dir = {:?}\n{extra}",
        dir.path()
    ))
    .unwrap();
    let ctx = UnitContext::from_settings(&settings, &BundledCountryData).unwrap();
    assert!(dir.path().join(CURRENCY_CODES_FILE).exists());

    let tables_path = dir.path().join("deflation.json");
    std::fs::File::create(&tables_path)
        .unwrap()
        .write_all(TABLES.as_bytes())
        .unwrap();
    let deflator = TableDeflator::from_file(&tables_path).unwrap();
    let resolver = CurrencyResolver::new(Arc::clone(ctx.currency_codes()), deflator)
        .with_default_source(settings.default_deflation_source);

    Fixture {
        settings,
        ctx,
        resolver,
        _dir: dir,
    }
}

mod change_currency {
    use super::*;

    #[test]
    fn test_cross_currency_and_year() {
        let Fixture { ctx, resolver, .. } = fixture();
        let capex = Parameter::builder(100.0)
            .units("USD_2015/kW")
            .build(&ctx)
            .unwrap();

        let converted = capex
            .change_currency(&ctx, &resolver, "EUR_2023", "DEU", Some(DeflationSource::WorldBank))
            .unwrap();

        // 100 USD_2015 is 90 EUR_2015, inflated by the German deflator to 2023
        assert_relative_eq!(converted.magnitude(), 112.5, max_relative = 1e-12);
        assert_eq!(converted.units(), Some("EUR_2023 / kW"));
        assert_eq!(resolver.memoized(), 2);

        let again = converted
            .change_currency(&ctx, &resolver, "EUR_2023", "DEU", Some(DeflationSource::WorldBank))
            .unwrap();
        assert_eq!(again, converted);
        assert_eq!(resolver.memoized(), 2);
    }

    #[test]
    fn test_missing_table_data() {
        let Fixture { ctx, resolver, .. } = fixture();
        let capex = Parameter::builder(100.0)
            .units("USD_2015/kW")
            .build(&ctx)
            .unwrap();
        assert!(matches!(
            capex.change_currency(&ctx, &resolver, "EUR_2023", "DEU", Some(DeflationSource::Imf)),
            Err(TechDataError::Deflation(_))
        ));
    }

    #[test]
    fn test_default_source_from_settings() {
        let Fixture { ctx, resolver, .. } = fixture();
        let capex = Parameter::builder(100.0)
            .units("USD_2015/kW")
            .build(&ctx)
            .unwrap();
        let converted = capex
            .change_currency(&ctx, &resolver, "EUR_2023", "DEU", None)
            .unwrap();
        assert_relative_eq!(converted.magnitude(), 112.5, max_relative = 1e-12);

        let Fixture {
            settings,
            ctx,
            resolver,
            ..
        } = fixture_with("default_deflation_source = \"imf\"\n");
        assert_eq!(settings.default_deflation_source, DeflationSource::Imf);
        assert_eq!(resolver.default_source(), DeflationSource::Imf);
        assert!(matches!(
            capex.change_currency(&ctx, &resolver, "EUR_2023", "DEU", None),
            Err(TechDataError::Deflation(_))
        ));
    }

    #[test]
    fn test_to_does_not_convert_currencies() {
        let Fixture { ctx, .. } = fixture();
        let capex = Parameter::builder(1000.0)
            .units("USD_2020/kW")
            .carrier("H2")
            .heating_value("LHV")
            .build(&ctx)
            .unwrap();
        assert!(matches!(
            capex.to(&ctx, "EUR_2025/kW"),
            Err(TechDataError::NotSupported(_))
        ));
    }
}

mod adjust_inflation {
    use super::*;

    #[test]
    fn test_keeps_currency() {
        let Fixture { ctx, resolver, .. } = fixture();
        let opex = Parameter::builder(10.0)
            .units("EUR_2015 / (kW * yr)")
            .build(&ctx)
            .unwrap();
        let adjusted = opex
            .adjust_inflation(&ctx, &resolver, 2023, "DEU", Some(DeflationSource::WorldBank))
            .unwrap();
        assert_relative_eq!(adjusted.magnitude(), 12.5, max_relative = 1e-12);
        assert_eq!(adjusted.units(), Some("EUR_2023 / (kW * yr)"));
    }
}
