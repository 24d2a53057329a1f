mod common;

use std::fs;

use common::setup_config_manager;
use expense_core::{
    config::Config,
    currency::{format_currency, LocaleConfig},
    errors::LedgerError,
    utils::paths::tmp_path,
};

#[test]
fn saved_config_round_trips() {
    let manager = setup_config_manager();
    let mut config = Config::default();
    config.set("locale", "en-US").unwrap();
    config.set("currency", "usd").unwrap();
    config.set("intensity.medium", "800").unwrap();
    manager.save(&config).unwrap();

    let loaded = manager.load().unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        format_currency(1250.5, &loaded.currency_code(), &loaded.locale_config()),
        "$1,250.5"
    );
}

#[test]
fn saving_leaves_no_temporary_file_behind() {
    let manager = setup_config_manager();
    manager.save(&Config::default()).unwrap();
    assert!(manager.path().exists());
    assert!(!tmp_path(manager.path()).exists());
}

#[test]
fn corrupt_file_is_reported() {
    let manager = setup_config_manager();
    fs::create_dir_all(manager.path().parent().unwrap()).unwrap();
    fs::write(manager.path(), "{ not json").unwrap();
    assert!(matches!(manager.load(), Err(LedgerError::Serde(_))));
}

#[test]
fn invalid_values_on_disk_are_rejected() {
    let manager = setup_config_manager();
    fs::create_dir_all(manager.path().parent().unwrap()).unwrap();
    fs::write(
        manager.path(),
        r#"{"locale":"es-AR","currency":"ARS","intensity":{"medium":5000,"high":100}}"#,
    )
    .unwrap();
    assert!(matches!(manager.load(), Err(LedgerError::Config(_))));
}

#[test]
fn default_locale_formats_argentine_pesos() {
    let config = Config::default();
    assert_eq!(config.locale_config(), LocaleConfig::es_ar());
    assert_eq!(
        format_currency(45000.0, &config.currency_code(), &config.locale_config()),
        "$ 45.000"
    );
}
