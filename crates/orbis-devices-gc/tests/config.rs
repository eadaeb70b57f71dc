use orbis_devices_gc::config::{DEFAULT_CU_MASK, DEFAULT_SUBMITS_ADDR, DEFAULT_SUBMITS_LEN};
use orbis_devices_gc::{GcConfigError, GcDeviceConfig};
use pretty_assertions::assert_eq;

#[test]
fn empty_section_uses_console_defaults() {
    let cfg: GcDeviceConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, GcDeviceConfig::default());
    assert_eq!(cfg.submits_addr, DEFAULT_SUBMITS_ADDR);
    assert_eq!(cfg.submits_len, DEFAULT_SUBMITS_LEN);
    assert_eq!(cfg.num_compute_units, 0);
    assert_eq!(cfg.cu_mask, DEFAULT_CU_MASK);
}

#[test]
fn partial_section_overrides_only_named_fields() {
    let cfg: GcDeviceConfig =
        serde_json::from_str(r#"{ "num_compute_units": 18, "submits_len": 32768 }"#).unwrap();
    assert_eq!(
        cfg,
        GcDeviceConfig {
            num_compute_units: 18,
            submits_len: 0x8000,
            ..Default::default()
        }
    );
    assert_eq!(cfg.validate(), Ok(()));
}

#[test]
fn config_round_trips_through_json() {
    let cfg = GcDeviceConfig {
        cu_mask: [0xff, 0x0f, 0, 0],
        ..Default::default()
    };
    let text = serde_json::to_string(&cfg).unwrap();
    let back: GcDeviceConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn malformed_values_are_rejected() {
    assert!(serde_json::from_str::<GcDeviceConfig>(r#"{ "cu_mask": [1, 2] }"#).is_err());

    let cfg: GcDeviceConfig = serde_json::from_str(r#"{ "submits_len": 100 }"#).unwrap();
    assert_eq!(
        cfg.validate(),
        Err(GcConfigError::UnalignedRingLength { len: 100 })
    );
}
