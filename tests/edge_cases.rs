use std::sync::Arc;
use zroute::{
    Address, CanonicalBox, Config, HostId, OrderBy, PartitionTree, RangeDecomposer, Router,
    SpaceConfig, ZrouteError,
};

/// Test 1: Single host owns the whole space
#[test]
fn test_single_host_topology() {
    let router = Router::builder().hosts(["only"]).build().unwrap();
    assert_eq!(router.route_get(&[i64::MIN, i64::MAX]).unwrap().as_str(), "only");
    assert_eq!(
        router.route_range(&[0, 0], &[1 << 20, 1 << 20]).unwrap(),
        vec![HostId::from("only")]
    );
}

/// Test 2: Wrong key shapes fail before touching the topology
#[test]
fn test_dimension_mismatch_everywhere() {
    let router = Router::builder().dims(3).hosts(["a", "b"]).build().unwrap();
    let expected = ZrouteError::DimensionMismatch {
        expected: 3,
        actual: 2,
    };
    assert_eq!(router.route_get(&[1, 2]), Err(expected.clone()));
    assert_eq!(router.route_range(&[1, 2], &[3, 4]), Err(expected.clone()));
    assert_eq!(router.route_around(&[1, 2], 5), Err(expected));
}

/// Test 3: Widest supported addresses (3 × 64 bits)
#[test]
fn test_full_width_coordinates() {
    let router = Router::builder()
        .dims(3)
        .bits_per_dim(64)
        .hosts((0..13).map(|i| format!("h{}", i)))
        .build()
        .unwrap();
    let start = [0, 0, 0];
    let end = [i64::MAX, i64::MAX, i64::MAX];
    let hosts = router.route_range(&start, &end).unwrap();
    assert!(hosts.contains(&router.route_get(&start).unwrap()));
    assert!(hosts.contains(&router.route_get(&end).unwrap()));

    let decomposer = RangeDecomposer::new(SpaceConfig::new(3, 64)).unwrap();
    let cover = decomposer
        .rect_cover(&[1, 2, 3], &[i64::MAX - 3, i64::MAX - 2, i64::MAX - 1])
        .unwrap();
    assert!(cover.len() <= 2 * 192);
}

/// Test 4: Degenerate range of one key
#[test]
fn test_point_range() {
    let router = Router::builder()
        .bits_per_dim(8)
        .hosts(["a", "b", "c", "d", "e"])
        .build()
        .unwrap();
    let owner = router.route_get(&[17, 33]).unwrap();
    assert_eq!(router.route_range(&[17, 33], &[17, 33]).unwrap(), vec![owner]);
}

/// Test 5: Inverted and malformed address ranges
#[test]
fn test_invalid_address_ranges() {
    let router = Router::builder()
        .dims(1)
        .bits_per_dim(4)
        .hosts(["a", "b"])
        .build()
        .unwrap();
    let a = |s: &str| s.parse::<Address>().unwrap();

    assert!(matches!(
        router.route_address_range(&a("1001"), &a("0110")),
        Err(ZrouteError::InvalidAddress(_))
    ));
    assert!(matches!(
        router.route_address_range(&a("01"), &a("0110")),
        Err(ZrouteError::InvalidAddress(_))
    ));
    assert!(matches!(
        "10z1".parse::<Address>(),
        Err(ZrouteError::InvalidAddress(_))
    ));
    // -1 encodes above 1 in two's complement Z-order.
    assert!(matches!(
        router.route_range(&[-1], &[1]),
        Err(ZrouteError::InvalidAddress(_))
    ));
    assert_eq!(
        router.route_address_range(&a("0000"), &a("1111")).unwrap(),
        router.route_all().unwrap()
    );
}

/// Test 6: Boxes that are deeper than the trie resolve to their leaf
#[test]
fn test_route_boxes_deeper_than_trie() {
    let router = Router::builder()
        .bits_per_dim(4)
        .hosts(["a", "b", "c", "d"])
        .build()
        .unwrap();
    let deep: CanonicalBox = "1101".parse().unwrap();
    assert_eq!(router.route_boxes([&deep]).unwrap(), vec![HostId::from("d")]);
    let root = CanonicalBox::root();
    assert_eq!(router.route_boxes([&root]).unwrap().len(), 4);
}

/// Test 7: More hosts than the address space has leaves
#[test]
fn test_oversubscribed_space() {
    let mut tree = PartitionTree::new(SpaceConfig::new(1, 2)).unwrap();
    for i in 0..10 {
        tree.add(HostId::new(format!("h{}", i)));
    }
    assert_eq!(tree.depth(), 4);
    for x in -2..2 {
        let owner = tree.route_key(&[x]).unwrap();
        assert!(tree.contains(owner));
    }
}

/// Test 8: Custom ordering policies are honoured by snapshots
#[test]
fn test_custom_ordering_snapshot() {
    let reverse = Arc::new(OrderBy::new(|a: &HostId, b: &HostId| b.cmp(a)));
    let router = Router::with_ordering(Config::default(), reverse.clone()).unwrap();
    for h in ["a", "b", "c"] {
        router.register_host(HostId::from(h));
    }
    let snapshot = router.snapshot();
    assert_eq!(
        snapshot.hosts,
        vec![HostId::from("c"), HostId::from("b"), HostId::from("a")]
    );

    let restored = Router::from_snapshot(snapshot, reverse).unwrap();
    assert_eq!(restored.route_get(&[5, -5]), router.route_get(&[5, -5]));
}

/// Test 9: Removing the last host empties the topology
#[test]
fn test_remove_last_host() {
    let router = Router::builder().hosts(["a"]).build().unwrap();
    assert!(router.unregister_host(&HostId::from("a")));
    assert_eq!(router.route_all(), Err(ZrouteError::EmptyTopology));
    assert_eq!(router.route_get(&[0, 0]), Err(ZrouteError::EmptyTopology));
    assert!(router.hosts().is_empty());
}

/// Test 10: Pruning boxes past the coordinate window are clamped
#[test]
fn test_route_around_clamps_to_window() {
    let router = Router::builder()
        .bits_per_dim(4)
        .hosts(["a", "b", "c", "d"])
        .build()
        .unwrap();
    assert_eq!(router.route_around(&[6, 6], u64::MAX).unwrap().len(), 4);
    assert_eq!(
        router.route_around(&[6, 6], 1).unwrap(),
        vec![router.route_get(&[6, 6]).unwrap()]
    );
}
