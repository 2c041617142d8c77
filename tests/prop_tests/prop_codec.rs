use crate::integration_tests::support::{CrewMember, crew_member};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use odm_lite::codec::{deserialize, serialize};
use odm_lite::temporal::{decode_date, decode_time, encode_date, encode_time};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_time_encoding_round_trips(h in 0u32..24, m in 0u32..60, s in 0u32..60, us in 0u32..1_000_000) {
        let t = NaiveTime::from_hms_micro_opt(h, m, s, us).unwrap();
        prop_assert_eq!(decode_time(encode_time(&t)), Some(t));
    }

    #[test]
    fn prop_date_encoding_preserves_order(y1 in -9999i32..9999, d1 in 0u64..365, y2 in -9999i32..9999, d2 in 0u64..365) {
        let a = NaiveDate::from_ymd_opt(y1, 1, 1).unwrap() + chrono::Days::new(d1);
        let b = NaiveDate::from_ymd_opt(y2, 1, 1).unwrap() + chrono::Days::new(d2);
        prop_assert_eq!(decode_date(encode_date(&a)), Some(a));
        prop_assert_eq!(a.cmp(&b), encode_date(&a).cmp(&encode_date(&b)));
    }

    #[test]
    fn prop_records_round_trip(
        group in any::<i64>(),
        rating in -1.0e6f64..1.0e6,
        active in any::<bool>(),
        ships in proptest::collection::vec("[A-Za-z ]{0,12}", 0..4),
        day in 0u64..36_500,
        shift in proptest::option::of((0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000)),
        millis in 0i64..2_000_000_000_000,
    ) {
        let mut record: CrewMember = crew_member(group);
        record.rating = rating;
        record.active = active;
        record.ships = ships;
        record.joined = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Days::new(day);
        record.shift = shift.and_then(|(h, m, s, us)| NaiveTime::from_hms_micro_opt(h, m, s, us));
        record.last_seen = Utc.timestamp_millis_opt(millis).unwrap();
        let stored = serialize(&record, &[]).unwrap();
        let back: CrewMember = deserialize(&stored).unwrap();
        prop_assert_eq!(back, record);
    }
}
