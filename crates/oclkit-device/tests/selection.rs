use oclkit_core::{
    DeviceCapability, DeviceCriteria, DevicePreference, DeviceTypeFilter, VendorFilter,
};
use oclkit_device::{
    ComputeManager, DeviceSpec, HostDescription, PlatformSpec, SelectionError,
};

const AMD: &str = "Advanced Micro Devices, Inc.";
const NVIDIA: &str = "NVIDIA Corporation";
const INTEL: &str = "Intel(R) Corporation";

fn names(devices: &[oclkit_device::Device]) -> Vec<&str> {
    devices.iter().map(|d| d.name.as_str()).collect()
}

/// P1 (AMD): D1 8 个计算单元无互操作，D2 16 个计算单元有互操作；P2 (NVIDIA): D3 4 个计算单元
fn two_vendor_host(d3_interop: bool) -> HostDescription {
    let d3 = DeviceSpec::gpu("D3").compute_units(4);
    let d3 = if d3_interop { d3.with_graphics_interop() } else { d3 };

    HostDescription::new()
        .platform(
            PlatformSpec::new("P1", AMD)
                .device(DeviceSpec::gpu("D1").compute_units(8))
                .device(DeviceSpec::gpu("D2").compute_units(16).with_graphics_interop()),
        )
        .platform(PlatformSpec::new("P2", NVIDIA).device(d3))
}

#[test]
fn test_compute_units_scenario() {
    let manager = ComputeManager::simulated(two_vendor_host(false));
    let criteria = DeviceCriteria::default()
        .device_type(DeviceTypeFilter::Gpu)
        .preference(DevicePreference::ComputeUnits)
        .device_count(1, 1);

    let candidates = manager.candidates(&criteria).unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(names(&candidates[0].retained), vec!["D2"]);
    assert_eq!(candidates[0].platform_score, 16);
    assert_eq!(names(&candidates[1].retained), vec!["D3"]);
    assert_eq!(candidates[1].platform_score, 4);

    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "P1");
    assert_eq!(selection.vendor, AMD);
    assert_eq!(names(&selection.devices), vec!["D2"]);
}

#[test]
fn test_no_screen_scenario_tie_keeps_first_platform() {
    let manager = ComputeManager::simulated(two_vendor_host(false));
    let criteria = DeviceCriteria::default()
        .device_type(DeviceTypeFilter::Gpu)
        .preference(DevicePreference::NotConnectedToScreen)
        .device_count(1, 2);

    let candidates = manager.candidates(&criteria).unwrap();
    assert_eq!(names(&candidates[0].retained), vec!["D1", "D2"]);
    assert_eq!(candidates[0].platform_score, 1);
    assert_eq!(candidates[1].platform_score, 1);

    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "P1");
    assert_eq!(names(&selection.devices), vec!["D1", "D2"]);
}

#[test]
fn test_no_screen_scenario_interop_device_scores_zero() {
    let manager = ComputeManager::simulated(two_vendor_host(true));
    let criteria = DeviceCriteria::default()
        .preference(DevicePreference::NotConnectedToScreen)
        .device_count(1, 2);

    let candidates = manager.candidates(&criteria).unwrap();
    assert_eq!(candidates[1].platform_score, 0);
    assert_eq!(manager.select_devices(&criteria).unwrap().platform_name, "P1");
}

#[test]
fn test_higher_score_replaces_winner() {
    let host = HostDescription::new()
        .platform(PlatformSpec::new("small", NVIDIA).device(DeviceSpec::gpu("a").global_mem_mib(512)))
        .platform(PlatformSpec::new("large", AMD).device(DeviceSpec::gpu("b").global_mem_mib(8192)));
    let manager = ComputeManager::simulated(host);
    let criteria = DeviceCriteria::default().preference(DevicePreference::GlobalMemory);

    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "large");
    assert_eq!(selection.platform_score, 8192);
}

#[test]
fn test_mismatch_free_platform_wins_regardless_of_score() {
    let host = HostDescription::new()
        .platform(
            PlatformSpec::new("Intel with discrete GPU", INTEL)
                .device(DeviceSpec::gpu("Radeon").vendor(AMD).compute_units(64)),
        )
        .platform(PlatformSpec::new("AMD APP", AMD).device(DeviceSpec::gpu("Radeon").compute_units(2)));
    let manager = ComputeManager::simulated(host);
    let criteria = DeviceCriteria::default().preference(DevicePreference::ComputeUnits);

    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "AMD APP");
    assert!(!selection.vendor_mismatch);
    assert_eq!(selection.platform_score, 2);
}

#[test]
fn test_mismatch_free_platform_must_meet_min_count() {
    let host = HostDescription::new()
        .platform(
            PlatformSpec::new("Intel with discrete GPUs", INTEL)
                .device(DeviceSpec::gpu("Radeon 0").vendor(AMD))
                .device(DeviceSpec::gpu("Radeon 1").vendor(AMD)),
        )
        .platform(PlatformSpec::new("AMD APP", AMD).device(DeviceSpec::gpu("Radeon")));
    let manager = ComputeManager::simulated(host);
    let criteria = DeviceCriteria::default().device_count(2, 2);

    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "Intel with discrete GPUs");
    assert!(selection.vendor_mismatch);
}

#[test]
fn test_preference_none_keeps_enumeration_order() {
    let host = HostDescription::new().platform(
        PlatformSpec::new("AMD APP", AMD)
            .device(DeviceSpec::gpu("a").compute_units(1))
            .device(DeviceSpec::gpu("b").compute_units(32))
            .device(DeviceSpec::cpu("c").compute_units(16)),
    );
    let manager = ComputeManager::simulated(host);

    let selection = manager.select_devices(&DeviceCriteria::default()).unwrap();
    assert_eq!(names(&selection.devices), vec!["a", "b", "c"]);
    assert_eq!(selection.platform_score, 0);

    let capped = DeviceCriteria::default().device_count(1, 2);
    let selection = manager.select_devices(&capped).unwrap();
    assert_eq!(names(&selection.devices), vec!["a", "b"]);
}

#[test]
fn test_device_count_within_bounds() {
    let host = HostDescription::new()
        .platform(
            PlatformSpec::new("NVIDIA CUDA", NVIDIA)
                .device(DeviceSpec::gpu("g0").compute_units(10))
                .device(DeviceSpec::gpu("g1").compute_units(30))
                .device(DeviceSpec::gpu("g2").compute_units(20))
                .device(DeviceSpec::gpu("g3").compute_units(40)),
        )
        .platform(PlatformSpec::new("Intel OpenCL", INTEL).device(DeviceSpec::cpu("cpu")));
    let manager = ComputeManager::simulated(host);

    for (min, max) in [(1, 1), (1, 3), (2, 2), (2, 10), (4, 4)] {
        for preference in [
            DevicePreference::None,
            DevicePreference::ComputeUnits,
            DevicePreference::NotConnectedToScreen,
        ] {
            let criteria = DeviceCriteria::default()
                .preference(preference)
                .device_count(min, max);
            let selection = manager.select_devices(&criteria).unwrap();
            assert!(selection.devices.len() >= min, "{:?} {}..{}", preference, min, max);
            assert!(selection.devices.len() <= max, "{:?} {}..{}", preference, min, max);
        }
    }

    let criteria = DeviceCriteria::default()
        .preference(DevicePreference::ComputeUnits)
        .device_count(1, 3);
    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(names(&selection.devices), vec!["g3", "g1", "g2"]);

    let criteria = DeviceCriteria::default().device_count(5, 8);
    assert_eq!(
        manager.select_devices(&criteria).unwrap_err(),
        SelectionError::NoValidPlatforms
    );
}

#[test]
fn test_vendor_filter() {
    let manager = ComputeManager::simulated(two_vendor_host(false));

    let criteria = DeviceCriteria::default().platform(VendorFilter::Nvidia);
    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "P2");

    let criteria = DeviceCriteria::default().platform(VendorFilter::Intel);
    assert_eq!(
        manager.select_devices(&criteria).unwrap_err(),
        SelectionError::NoValidPlatforms
    );
}

#[test]
fn test_required_capability_filters_devices() {
    let manager = ComputeManager::simulated(two_vendor_host(false));
    let criteria = DeviceCriteria::default().capability(DeviceCapability::OpenGlInterop);

    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "P1");
    assert_eq!(names(&selection.devices), vec!["D2"]);
}

#[test]
fn test_zero_platforms_installed() {
    let manager = ComputeManager::simulated(HostDescription::new());
    assert_eq!(
        manager.select_devices(&DeviceCriteria::default()).unwrap_err(),
        SelectionError::NoPlatformsInstalled
    );
}

#[test]
fn test_no_device_matches_filters() {
    let manager = ComputeManager::simulated(two_vendor_host(false));
    let criteria = DeviceCriteria::default().device_type(DeviceTypeFilter::Cpu);
    assert_eq!(
        manager.select_devices(&criteria).unwrap_err(),
        SelectionError::NoValidPlatforms
    );
}

#[test]
fn test_missing_display_means_no_interop_devices() {
    let manager = ComputeManager::simulated(two_vendor_host(true).without_display());

    let criteria = DeviceCriteria::default().capability(DeviceCapability::OpenGlInterop);
    assert_eq!(
        manager.select_devices(&criteria).unwrap_err(),
        SelectionError::NoValidPlatforms
    );

    // 检测失败时所有设备都按未连接显示器计分
    let criteria = DeviceCriteria::default().preference(DevicePreference::NotConnectedToScreen);
    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "P1");
    assert_eq!(selection.platform_score, 2);
}

#[test]
fn test_failing_platform_does_not_abort_selection() {
    let host = HostDescription::new()
        .platform(PlatformSpec::new("Broken", NVIDIA).failing_device_query())
        .platform(PlatformSpec::new("Intel OpenCL", INTEL).device(DeviceSpec::cpu("cpu")));
    let manager = ComputeManager::simulated(host);

    let selection = manager.select_devices(&DeviceCriteria::default()).unwrap();
    assert_eq!(selection.platform_name, "Intel OpenCL");
}

#[test]
fn test_criteria_are_not_mutated_by_selection() {
    let manager = ComputeManager::simulated(two_vendor_host(false));
    let criteria = DeviceCriteria::default()
        .preference(DevicePreference::ComputeUnits)
        .device_count(1, 1);
    let before = criteria.clone();

    manager.select_devices(&criteria).unwrap();
    assert_eq!(criteria, before);
}

#[test]
fn test_global_memory_scores_whole_mib() {
    let host = HostDescription::new()
        .platform(PlatformSpec::new("first", NVIDIA).device(DeviceSpec::gpu("a").global_mem_mib(2)))
        .platform(
            PlatformSpec::new("second", AMD)
                .device(DeviceSpec::gpu("b").global_mem_bytes(3 * 1024 * 1024 - 1)),
        );
    let manager = ComputeManager::simulated(host);
    let criteria = DeviceCriteria::default().preference(DevicePreference::GlobalMemory);

    // 不足 1 MiB 的部分不计分，两个平台同分，先枚举的平台胜出
    let selection = manager.select_devices(&criteria).unwrap();
    assert_eq!(selection.platform_name, "first");
    assert_eq!(selection.platform_score, 2);
}
