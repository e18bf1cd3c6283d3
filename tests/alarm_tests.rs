//! Integration tests for Alarm

mod common;
use common::*;

use sunrise_clock::chrono::{NaiveTime, Weekday};
use sunrise_clock::config::{NOT_SOON_SECONDS, SNOOZE_MINUTES};
use sunrise_clock::{Alarm, AlarmError, LockTimeout};

const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Active alarm at `hour:minute` scheduled on the given days only
fn alarm_on(hour: u32, minute: u32, days: &[Weekday]) -> Alarm {
    let mut alarm = Alarm::new("alarm1").unwrap();
    for day in WEEK {
        if !days.contains(&day) {
            alarm.toggle_day(day);
        }
    }
    alarm.set_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap());
    alarm.activate();
    alarm
}

#[test]
fn new_alarm_uses_factory_defaults() {
    let alarm = Alarm::new("alarm1").unwrap();

    assert_eq!(alarm.id(), "alarm1");
    assert_eq!(alarm.hour(), 12);
    assert_eq!(alarm.minute(), 0);
    assert_eq!(alarm.day_mask(), 0x7F);
    assert!(!alarm.is_active());
    assert!(!alarm.is_sunrise_enabled());
    assert_eq!(alarm.snooze_count(), 0);
    assert_eq!(alarm.format_days().as_str(), "SuMoTuWeThFrSa");
}

#[test]
fn new_rejects_overlong_id() {
    let result = Alarm::new("alarm12345");
    assert_eq!(result, Err(AlarmError::IdTooLong { len: 10 }));
}

#[test]
fn load_from_empty_store_gives_defaults() {
    let mut hw = MockHardware::new(0);
    let alarm = Alarm::load("alarm1", &mut hw).unwrap();

    assert_eq!(alarm, Alarm::new("alarm1").unwrap());
}

#[test]
fn load_reads_stored_fields() {
    let mut hw = MockHardware::new(0);
    hw.preset("alarm2Hour", StoredValue::I8(6));
    hw.preset("alarm2Min", StoredValue::I8(45));
    hw.preset("alarm2Days", StoredValue::U8(0b1011_1110));
    hw.preset("alarm2Sunrise", StoredValue::Bool(true));

    let alarm = Alarm::load("alarm2", &mut hw).unwrap();

    assert_eq!(alarm.hour(), 6);
    assert_eq!(alarm.minute(), 45);
    assert_eq!(alarm.snooze_hour(), 6);
    assert_eq!(alarm.snooze_minute(), 45);
    assert!(alarm.is_active());
    assert!(alarm.is_sunrise_enabled());
    assert!(!alarm.is_scheduled_on(Weekday::Sun));
    assert!(alarm.is_scheduled_on(Weekday::Mon));
}

#[test]
fn load_replaces_out_of_range_time_with_defaults() {
    let mut hw = MockHardware::new(0);
    hw.preset("alarm1Hour", StoredValue::I8(30));
    hw.preset("alarm1Min", StoredValue::I8(75));

    let alarm = Alarm::load("alarm1", &mut hw).unwrap();

    assert_eq!(alarm.hour(), 12);
    assert_eq!(alarm.minute(), 0);
}

#[test]
fn load_through_the_shared_store_lock() {
    let mut bus = hardware_bus(0);
    let clock = MockTimeSource::new();
    bus.get_mut().preset("alarm1Hour", StoredValue::I8(6));

    // Startup: nothing else holds the bus yet
    let at_boot = Alarm::load("alarm1", bus.get_mut()).unwrap();
    // Later: the bus is shared
    let shared = bus
        .lock_within_ms(&clock, 0, |hw| Alarm::load("alarm1", hw))
        .unwrap()
        .unwrap();

    assert_eq!(at_boot.hour(), 6);
    assert_eq!(at_boot, shared);
}

#[test]
fn persist_writes_only_changed_fields() {
    let bus = hardware_bus(0);
    let clock = MockTimeSource::new();
    let mut alarm = Alarm::new("alarm1").unwrap();

    alarm.persist(&bus, &clock).unwrap();
    let first: Vec<String> = bus
        .lock_within_ms(&clock, 0, |hw| hw.writes().to_vec())
        .unwrap();
    assert_eq!(
        first,
        ["alarm1Hour", "alarm1Min", "alarm1Days", "alarm1Sunrise"]
    );

    bus.lock_within_ms(&clock, 0, |hw| hw.clear_writes()).unwrap();
    alarm.persist(&bus, &clock).unwrap();
    let unchanged = bus
        .lock_within_ms(&clock, 0, |hw| hw.writes().len())
        .unwrap();
    assert_eq!(unchanged, 0);

    alarm.adjust_minutes(15).unwrap();
    alarm.persist(&bus, &clock).unwrap();
    let (writes, stored) = bus
        .lock_within_ms(&clock, 0, |hw| (hw.writes().to_vec(), hw.stored("alarm1Min")))
        .unwrap();
    assert_eq!(writes, ["alarm1Min"]);
    assert_eq!(stored, Some(StoredValue::I8(15)));
}

#[test]
fn persist_gives_up_when_store_is_busy() {
    let bus = hardware_bus(0);
    let clock = MockTimeSource::ticking(1);
    let alarm = Alarm::new("alarm1").unwrap();

    // Hold the store while persisting
    let result = bus
        .lock_within_ms(&clock, 10, |_held| alarm.persist(&bus, &clock))
        .unwrap();
    assert_eq!(result, Err(LockTimeout { waited_ms: 1000 }));

    let writes = bus
        .lock_within_ms(&clock, 10, |hw| hw.writes().len())
        .unwrap();
    assert_eq!(writes, 0);
}

#[test]
fn adjust_hours_wraps_between_1_and_24() {
    let mut alarm = Alarm::new("alarm1").unwrap();

    alarm.adjust_hours(12).unwrap();
    assert_eq!(alarm.hour(), 24);

    alarm.adjust_hours(1).unwrap();
    assert_eq!(alarm.hour(), 1);

    alarm.adjust_hours(-1).unwrap();
    assert_eq!(alarm.hour(), 24);

    alarm.adjust_hours(-12).unwrap();
    assert_eq!(alarm.hour(), 12);
}

#[test]
fn adjust_rejects_large_steps() {
    let mut alarm = Alarm::new("alarm1").unwrap();

    assert_eq!(
        alarm.adjust_hours(13),
        Err(AlarmError::DeltaOutOfRange {
            delta: 13,
            limit: 12
        })
    );
    assert!(alarm.adjust_hours(i32::MIN).is_err());
    assert!(alarm.adjust_minutes(-31).is_err());
    assert_eq!(alarm.hour(), 12);
    assert_eq!(alarm.minute(), 0);
}

#[test]
fn adjust_minutes_wraps_without_carrying_the_hour() {
    let mut alarm = Alarm::new("alarm1").unwrap();

    alarm.adjust_minutes(-1).unwrap();
    assert_eq!(alarm.minute(), 59);
    assert_eq!(alarm.hour(), 12);

    alarm.adjust_minutes(1).unwrap();
    assert_eq!(alarm.minute(), 0);
    assert_eq!(alarm.hour(), 12);
}

#[test]
fn adjusting_discards_snooze() {
    let mut alarm = alarm_on(7, 0, &WEEK);
    alarm.snooze();
    assert_eq!(alarm.snooze_count(), 1);

    alarm.adjust_minutes(10).unwrap();

    assert_eq!(alarm.snooze_count(), 0);
    assert_eq!(alarm.snooze_minute(), 10);
}

#[test]
fn set_days_adds_to_the_schedule() {
    let mut alarm = alarm_on(7, 0, &[]);
    assert_eq!(alarm.format_days().as_str(), "______________");

    alarm
        .set_days(&[false, false, false, true, false, false, false])
        .unwrap();
    assert_eq!(alarm.format_days().as_str(), "______We______");

    alarm
        .set_days(&[true, false, false, false, false, false, false])
        .unwrap();
    assert_eq!(alarm.format_days().as_str(), "Su____We______");
    assert_eq!(
        alarm.days(),
        [true, false, false, true, false, false, false]
    );
}

#[test]
fn set_days_rejects_wrong_length() {
    let mut alarm = alarm_on(7, 0, &[Weekday::Mon]);

    let result = alarm.set_days(&[true; 6]);

    assert_eq!(result, Err(AlarmError::InvalidDayCount(6)));
    assert_eq!(alarm.days(), [false, true, false, false, false, false, false]);
}

#[test]
fn active_bit_is_independent_of_days() {
    let mut alarm = alarm_on(7, 0, &[Weekday::Mon]);
    assert!(alarm.is_active());
    assert_eq!(alarm.day_mask(), 0b1000_0010);

    assert!(!alarm.toggle_active());
    assert_eq!(alarm.day_mask(), 0b0000_0010);

    assert!(alarm.toggle_active());
}

#[test]
fn rings_on_scheduled_day_at_alarm_minute() {
    let alarm = alarm_on(7, 0, &[Weekday::Mon]);

    assert!(alarm.should_ring(&monday(7, 0)));
    assert!(alarm.should_ring(&at(2024, 1, 1, 7, 0, 45)));
    assert!(!alarm.should_ring(&monday(7, 1)));
    assert!(!alarm.should_ring(&monday(19, 0)));
    // Tuesday
    assert!(!alarm.should_ring(&at(2024, 1, 2, 7, 0, 0)));
}

#[test]
fn inactive_alarm_never_rings() {
    let mut alarm = alarm_on(7, 0, &WEEK);
    alarm.deactivate();

    assert!(!alarm.should_ring(&monday(7, 0)));
}

#[test]
fn midnight_alarm_rings_at_hour_zero() {
    let alarm = alarm_on(0, 0, &WEEK);
    assert_eq!(alarm.hour(), 24);

    assert!(alarm.should_ring(&monday(0, 0)));
    assert!(!alarm.should_ring(&monday(12, 0)));
}

#[test]
fn snooze_moves_trigger_forward() {
    let mut alarm = alarm_on(7, 0, &WEEK);

    for _ in 0..3 {
        alarm.snooze();
    }

    assert_eq!(alarm.snooze_count(), 3);
    assert_eq!(alarm.snooze_hour(), 7);
    assert_eq!(alarm.snooze_minute(), 3 * SNOOZE_MINUTES);
    assert_eq!(alarm.hour(), 7);
    assert_eq!(alarm.minute(), 0);
    assert!(alarm.should_ring(&monday(7, 3 * SNOOZE_MINUTES as u32)));
    assert!(!alarm.should_ring(&monday(7, 0)));
}

#[test]
fn snooze_carries_into_next_hour() {
    let mut alarm = alarm_on(0, 59, &WEEK);
    assert_eq!(alarm.hour(), 24);

    alarm.snooze();

    assert_eq!(alarm.snooze_hour(), 1);
    assert_eq!(alarm.snooze_minute(), SNOOZE_MINUTES - 1);
}

#[test]
fn snoozed_alarm_rings_past_midnight_on_unscheduled_day() {
    let mut alarm = alarm_on(23, 59, &[Weekday::Mon]);

    alarm.snooze();

    assert_eq!(alarm.snooze_hour(), 24);
    // Tuesday just after midnight
    let tuesday = at(2024, 1, 2, 0, (SNOOZE_MINUTES - 1) as u32, 0);
    assert!(alarm.should_ring(&tuesday));
}

#[test]
fn reset_snooze_restores_alarm_time() {
    let mut alarm = alarm_on(7, 0, &WEEK);
    alarm.snooze();
    alarm.snooze();

    alarm.reset_snooze();

    assert_eq!(alarm.snooze_count(), 0);
    assert_eq!(alarm.snooze_hour(), 7);
    assert_eq!(alarm.snooze_minute(), 0);
}

#[test]
fn seconds_until_later_today() {
    let alarm = alarm_on(7, 0, &[Weekday::Mon]);

    assert_eq!(alarm.seconds_until(&monday(6, 0)), 3600);
    assert_eq!(alarm.seconds_until(&at(2024, 1, 1, 6, 59, 30)), 30);
}

#[test]
fn seconds_until_tomorrow() {
    let alarm = alarm_on(7, 0, &[Weekday::Mon]);
    // Sunday evening
    let sunday = at(2023, 12, 31, 8, 0, 0);

    assert_eq!(alarm.seconds_until(&sunday), 23 * 3600);
}

#[test]
fn seconds_until_not_soon_when_nothing_scheduled() {
    let alarm = alarm_on(7, 0, &[Weekday::Mon]);

    // Already past today, Tuesday not scheduled
    assert_eq!(alarm.seconds_until(&monday(7, 0)), NOT_SOON_SECONDS);
    assert_eq!(alarm.seconds_until(&monday(8, 0)), NOT_SOON_SECONDS);
}

#[test]
fn seconds_until_midnight_alarm() {
    let alarm = alarm_on(0, 0, &WEEK);

    assert_eq!(alarm.seconds_until(&monday(23, 0)), 3600);
}

#[test]
fn format_time_uses_twelve_hour_clock() {
    let cases = [
        ((0, 0), "12:00 AM"),
        ((12, 30), "12:30 PM"),
        ((13, 5), "1:05 PM"),
        ((1, 0), "1:00 AM"),
        ((23, 59), "11:59 PM"),
    ];

    for ((hour, minute), expected) in cases {
        let alarm = alarm_on(hour, minute, &WEEK);
        assert_eq!(alarm.format_time().as_str(), expected);
    }
}

#[test]
fn sunrise_flag_is_persisted() {
    let bus = hardware_bus(0);
    let clock = MockTimeSource::new();
    let mut alarm = Alarm::new("alarm1").unwrap();
    alarm.toggle_sunrise();
    assert!(alarm.is_sunrise_enabled());

    alarm.persist(&bus, &clock).unwrap();

    let stored = bus
        .lock_within_ms(&clock, 0, |hw| hw.stored("alarm1Sunrise"))
        .unwrap();
    assert_eq!(stored, Some(StoredValue::Bool(true)));
}
