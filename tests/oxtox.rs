use dive_planner_deco::OxTox;

fn close(value: f64, expected: f64, tolerance: f64) -> bool {
    (value - expected).abs() < tolerance
}

#[test]
fn test_add_o2_reproduces_noaa_table() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(600.0, 1.3);

    assert!(close(ox_tox.cns, 0.0555555555556, 1e-12));
    assert!(close(ox_tox.otu, 14.7944872366, 1e-9));
    assert_eq!(ox_tox.max_ppo2, 1.3);
}

#[test]
fn test_remove_o2_decays_cns_keeps_otu() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(600.0, 1.3);
    let otu = ox_tox.otu;
    ox_tox.remove_o2(14400.0);

    assert!(close(ox_tox.cns, 0.00874945594818, 1e-13));
    assert_eq!(ox_tox.otu, otu);
}

#[test]
fn test_remove_o2_after_a_day_resets_otu() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(600.0, 1.3);
    ox_tox.remove_o2(90000.0);

    assert_eq!(ox_tox.otu, 0.0);
    assert!(ox_tox.cns > 0.0);
    assert!(ox_tox.cns < 1e-5);
}

#[test]
fn test_exposure_accumulates() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(600.0, 1.3);
    ox_tox.add_o2(600.0, 1.3);

    assert!(close(ox_tox.cns, 2.0 * 0.0555555555556, 1e-12));
    assert!(close(ox_tox.otu, 2.0 * 14.7944872366, 1e-9));
}

#[test]
fn test_max_ppo2_is_a_running_maximum() {
    let mut ox_tox = OxTox::new();
    ox_tox.add_o2(60.0, 1.4);
    ox_tox.add_o2(60.0, 0.9);

    assert_eq!(ox_tox.max_ppo2, 1.4);
}
