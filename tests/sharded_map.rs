use snapmap::ShardedMap;
use std::thread;

#[test]
fn default_shard_count_is_32() {
    let map: ShardedMap<String, i32> = ShardedMap::new();
    assert_eq!(map.shard_count(), 32);
}

#[test]
fn shard_count_rounds_up_to_power_of_two() {
    assert_eq!(ShardedMap::<String, i32>::with_shards(5).shard_count(), 8);
    assert_eq!(ShardedMap::<String, i32>::with_shards(32).shard_count(), 32);
    assert_eq!(ShardedMap::<String, i32>::with_shards(1).shard_count(), 1);
    assert_eq!(ShardedMap::<String, i32>::with_shards(0).shard_count(), 1);
}

#[test]
fn insert_get_remove() {
    let map: ShardedMap<String, i32> = ShardedMap::new();

    assert_eq!(map.insert("a".into(), 1), None);
    assert_eq!(map.insert("a".into(), 2), Some(1));
    assert_eq!(map.get("a"), Some(2));
    assert!(map.contains_key("a"));

    assert_eq!(map.remove("a"), Some(2));
    assert_eq!(map.remove("a"), None);
    assert!(!map.contains_key("a"));
}

#[test]
fn string_keys_look_up_by_str() {
    let map: ShardedMap<String, i32> = ShardedMap::new();
    map.insert("owned".to_string(), 7);

    // &str works for lookups; no need to allocate a String
    assert_eq!(map.get("owned"), Some(7));
    assert!(map.contains_key("owned"));
    assert_eq!(map.remove("owned"), Some(7));
}

#[test]
fn insert_if_absent_first_write_wins() {
    let map: ShardedMap<String, i32> = ShardedMap::new();

    assert!(map.insert_if_absent("k".into(), 1));
    assert!(!map.insert_if_absent("k".into(), 2));
    assert_eq!(map.get("k"), Some(1));
}

#[test]
fn len_and_clear_span_all_shards() {
    let map: ShardedMap<String, i32> = ShardedMap::with_shards(8);
    assert!(map.is_empty());

    for i in 0..100 {
        map.insert(format!("k{i}"), i);
    }
    assert_eq!(map.len(), 100);
    assert!(!map.is_empty());

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
}

#[test]
fn extend_inserts_everything() {
    let map: ShardedMap<String, i32> = ShardedMap::new();
    map.extend((0..25).map(|i| (format!("k{i}"), i)));
    assert_eq!(map.len(), 25);
    assert_eq!(map.get("k24"), Some(24));
}

#[test]
fn for_each_visits_all_entries() {
    let map: ShardedMap<String, i32> = ShardedMap::new();
    for i in 0..40 {
        map.insert(format!("k{i}"), i);
    }

    let mut sum = 0;
    map.for_each(|_, v| sum += v);
    assert_eq!(sum, (0..40).sum::<i32>());
}

#[test]
fn entries_keys_values_snapshots() {
    let map: ShardedMap<String, i32> = ShardedMap::new();
    map.insert("x".into(), 10);
    map.insert("y".into(), 20);

    let mut entries = map.entries();
    entries.sort();
    assert_eq!(entries, vec![("x".to_string(), 10), ("y".to_string(), 20)]);

    let mut keys = map.keys();
    keys.sort();
    assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);

    let mut values = map.values();
    values.sort();
    assert_eq!(values, vec![10, 20]);
}

#[test]
fn concurrent_inserts_all_land() {
    let map: ShardedMap<String, i32> = ShardedMap::new();

    thread::scope(|s| {
        for t in 0..16 {
            let map = &map;
            s.spawn(move || {
                for i in 0..100 {
                    map.insert(format!("t{t}_k{i}"), i);
                }
            });
        }
    });

    assert_eq!(map.len(), 16 * 100);
}

#[test]
fn default_is_empty() {
    let map: ShardedMap<String, String> = ShardedMap::default();
    assert!(map.is_empty());
    assert_eq!(map.shard_count(), 32);
}

#[test]
fn debug_reports_shape() {
    let map: ShardedMap<String, i32> = ShardedMap::with_shards(4);
    map.insert("a".into(), 1);
    let dbg = format!("{map:?}");
    assert!(dbg.contains("ShardedMap"));
    assert!(dbg.contains("shards"));
}
