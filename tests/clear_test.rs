use chainmap_rs::ChainMap;

#[test]
fn test_clear_basic() {
    let mut m: ChainMap<u64, String> = ChainMap::with_capacity(16);

    m.insert(1, "one".to_string());
    m.insert(2, "two".to_string());
    m.insert(3, "three".to_string());
    assert_eq!(m.len(), 3);
    assert!(!m.is_empty());

    m.clear();

    assert_eq!(m.len(), 0);
    assert!(m.is_empty());
    assert_eq!(m.get(&1), None);
    assert_eq!(m.get(&2), None);
    assert_eq!(m.get(&3), None);
    assert_eq!(m.iter().count(), 0);
}

#[test]
fn test_clear_empty_map() {
    let mut m: ChainMap<u64, String> = ChainMap::new();

    // Clear before any table exists
    m.clear();

    assert_eq!(m.len(), 0);
    assert!(m.is_empty());
    assert_eq!(m.capacity(), 0);
}

#[test]
fn test_clear_and_reinsert() {
    let mut m: ChainMap<u64, String> = ChainMap::with_capacity(32);

    for i in 0..10 {
        m.insert(i, format!("value_{}", i));
    }
    assert_eq!(m.len(), 10);

    m.clear();
    assert!(m.is_empty());

    for i in 0..5 {
        assert_eq!(m.insert(i + 100, format!("new_value_{}", i)), None);
    }
    assert_eq!(m.len(), 5);

    for i in 0..5 {
        assert_eq!(m.get(&(i + 100)), Some(&format!("new_value_{}", i)));
    }
    for i in 0..10 {
        assert_eq!(m.get(&i), None);
    }
}

#[test]
fn test_clear_keeps_capacity() {
    let mut m: ChainMap<u64, u64> = ChainMap::new();

    for i in 0..1000 {
        m.insert(i, i * 2);
    }
    let capacity = m.capacity();
    let threshold = m.threshold();
    assert_eq!(capacity, 2048);

    m.clear();

    assert_eq!(m.len(), 0);
    assert_eq!(m.capacity(), capacity);
    assert_eq!(m.threshold(), threshold);
    assert_eq!(m.get(&0), None);
    assert_eq!(m.get(&500), None);
    assert_eq!(m.get(&999), None);
}

#[test]
fn test_clear_multiple_times() {
    let mut m: ChainMap<u64, u64> = ChainMap::with_capacity(32);

    for round in 0..5 {
        for i in 0..20 {
            m.insert(i + round * 100, i * round);
        }
        assert_eq!(m.len(), 20);

        m.clear();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
    }
}

#[test]
fn test_retain_even_keys() {
    let mut m: ChainMap<u64, String> = ChainMap::new();
    for i in 0..100 {
        m.insert(i, format!("value_{}", i));
    }

    m.retain(|k, _| k.is_some_and(|k| k % 2 == 0));

    assert_eq!(m.len(), 50);
    for i in 0..100 {
        if i % 2 == 0 {
            assert_eq!(m.get(&i), Some(&format!("value_{}", i)));
        } else {
            assert_eq!(m.get(&i), None);
        }
    }
    assert_eq!(m.iter().count(), 50);
}

#[test]
fn test_retain_can_update_kept_values() {
    let mut m: ChainMap<u32, u32> = (0..20).map(|i| (i, i)).collect();
    m.insert_unkeyed(1000);

    m.retain(|k, v| {
        *v += 1;
        k.is_none() || *v > 10
    });

    assert_eq!(m.len(), 11);
    assert_eq!(m.get_unkeyed(), Some(&1001));
    assert_eq!(m.get(&9), None);
    assert_eq!(m.get(&10), Some(&11));
    assert_eq!(m.get(&19), Some(&20));
}

#[test]
fn test_retain_nothing() {
    let mut m: ChainMap<u32, u32> = (0..50).map(|i| (i, i)).collect();
    m.retain(|_, _| false);
    assert!(m.is_empty());
    assert_eq!(m.iter().count(), 0);
    assert_eq!(m.insert(3, 3), None);
    assert_eq!(m.len(), 1);
}

#[test]
fn test_retain_panic_leaves_map_consistent() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let mut m: ChainMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
    let mut calls = 0;

    // first call drops its entry, second keeps, third panics
    let result = catch_unwind(AssertUnwindSafe(|| {
        m.retain(|_, _| {
            calls += 1;
            if calls == 3 {
                panic!("retain closure failed");
            }
            calls % 2 == 0
        });
    }));
    assert!(result.is_err());

    assert_eq!(m.len(), 9);
    assert_eq!(m.len(), m.iter().count());
    assert_eq!(m.iter().len(), m.iter().count());

    // the map stays usable
    m.retain(|_, _| true);
    assert_eq!(m.len(), 9);
    m.retain(|_, _| false);
    assert!(m.is_empty());
    assert_eq!(m.iter().count(), 0);
}
