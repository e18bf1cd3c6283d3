//! Shared test infrastructure for sunrise-clock integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_graphics::prelude::{Point, Size};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::rc::Rc;
use sunrise_clock::chrono::{NaiveDate, NaiveDateTime};
use sunrise_clock::{
    Hsb, LedStrip, PreferenceStore, RGB8, Rgb565, SpriteSurface, TimeDuration, TimeInstant,
    TimeSource, TimedMutex,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement.
///
/// With a non-zero step every `now()` call moves time forward, so a spin on a
/// held lock runs into its timeout instead of looping forever.
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
    step: u64,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
            step: 0,
        }
    }

    /// Time source that advances `step_ms` on every read
    pub fn ticking(step_ms: u64) -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
            step: step_ms,
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn current(&self) -> TestInstant {
        self.current_time.get()
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        let now = self.current_time.get();
        self.current_time.set(TestInstant(now.0 + self.step));
        now
    }
}

// ============================================================================
// Mock Hardware (preference store + LED strip behind one lock)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoredValue {
    I8(i8),
    U8(u8),
    F32(f32),
    Bool(bool),
}

/// Mock hardware that stores preferences in memory and records strip writes
pub struct MockHardware {
    prefs: HashMap<String, StoredValue>,
    writes: Vec<String>,
    pixels: Vec<RGB8>,
    fills: Vec<(Range<usize>, RGB8)>,
    dirty: bool,
    ready: bool,
    shows: usize,
}

impl MockHardware {
    pub fn new(pixel_count: usize) -> Self {
        Self {
            prefs: HashMap::new(),
            writes: Vec::new(),
            pixels: vec![RGB8::default(); pixel_count],
            fills: Vec::new(),
            dirty: false,
            ready: true,
            shows: 0,
        }
    }

    /// Store a value without recording it as a write
    pub fn preset(&mut self, key: &str, value: StoredValue) {
        self.prefs.insert(key.to_string(), value);
    }

    pub fn stored(&self, key: &str) -> Option<StoredValue> {
        self.prefs.get(key).copied()
    }

    /// Keys written through `put_*`, in order
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    pub fn fills(&self) -> &[(Range<usize>, RGB8)] {
        &self.fills
    }

    pub fn clear_fills(&mut self) {
        self.fills.clear();
    }

    pub fn pixel(&self, index: usize) -> RGB8 {
        self.pixels[index]
    }

    pub fn shows(&self) -> usize {
        self.shows
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    fn put(&mut self, key: &str, value: StoredValue) {
        self.prefs.insert(key.to_string(), value);
        self.writes.push(key.to_string());
    }
}

impl PreferenceStore for MockHardware {
    fn get_i8(&mut self, key: &str, default: i8) -> i8 {
        match self.prefs.get(key) {
            Some(StoredValue::I8(v)) => *v,
            _ => default,
        }
    }

    fn put_i8(&mut self, key: &str, value: i8) {
        self.put(key, StoredValue::I8(value));
    }

    fn get_u8(&mut self, key: &str, default: u8) -> u8 {
        match self.prefs.get(key) {
            Some(StoredValue::U8(v)) => *v,
            _ => default,
        }
    }

    fn put_u8(&mut self, key: &str, value: u8) {
        self.put(key, StoredValue::U8(value));
    }

    fn get_f32(&mut self, key: &str, default: f32) -> f32 {
        match self.prefs.get(key) {
            Some(StoredValue::F32(v)) => *v,
            _ => default,
        }
    }

    fn put_f32(&mut self, key: &str, value: f32) {
        self.put(key, StoredValue::F32(value));
    }

    fn get_bool(&mut self, key: &str, default: bool) -> bool {
        match self.prefs.get(key) {
            Some(StoredValue::Bool(v)) => *v,
            _ => default,
        }
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.put(key, StoredValue::Bool(value));
    }
}

impl LedStrip for MockHardware {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn fill(&mut self, pixels: Range<usize>, color: RGB8) {
        for pixel in &mut self.pixels[pixels.clone()] {
            *pixel = color;
        }
        self.fills.push((pixels, color));
        self.dirty = true;
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn can_show(&self) -> bool {
        self.ready
    }

    fn show(&mut self) {
        self.dirty = false;
        self.shows += 1;
    }
}

pub type HardwareBus = TimedMutex<NoopRawMutex, MockHardware>;

pub fn hardware_bus(pixel_count: usize) -> HardwareBus {
    TimedMutex::new(MockHardware::new(pixel_count))
}

// ============================================================================
// Mock Sprite Surface
// ============================================================================

/// Screen target that records where sprites were pushed
#[derive(Debug, Default)]
pub struct MockScreen {
    pub pushes: Vec<Point>,
}

/// Monospace font width used by `MockSurface`
pub const GLYPH_WIDTH: i32 = 8;

/// Drawing calls recorded by `MockSurface`
#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub size: Option<Size>,
    pub creates: usize,
    pub deletes: usize,
    pub fills: usize,
    /// Text draws since the last fill
    pub frame: Vec<(String, Point, Rgb565)>,
}

/// Mock sprite whose log stays readable after it is moved into a `ScrollingText`
pub struct MockSurface {
    log: Rc<RefCell<SurfaceLog>>,
}

impl MockSurface {
    pub fn new() -> (Self, Rc<RefCell<SurfaceLog>>) {
        let log = Rc::new(RefCell::new(SurfaceLog::default()));
        (Self { log: log.clone() }, log)
    }
}

impl SpriteSurface for MockSurface {
    type Target = MockScreen;

    fn create(&mut self, size: Size) {
        let mut log = self.log.borrow_mut();
        log.size = Some(size);
        log.creates += 1;
    }

    fn delete(&mut self) {
        let mut log = self.log.borrow_mut();
        log.size = None;
        log.deletes += 1;
    }

    fn fill(&mut self, _color: Rgb565) {
        let mut log = self.log.borrow_mut();
        log.fills += 1;
        log.frame.clear();
    }

    fn draw_text(&mut self, text: &str, position: Point, color: Rgb565) {
        self.log
            .borrow_mut()
            .frame
            .push((text.to_string(), position, color));
    }

    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * GLYPH_WIDTH
    }

    fn push(&self, target: &mut MockScreen, position: Point) {
        target.pushes.push(position);
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Wall-clock time on a given date
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

/// Monday 2024-01-01 at the given time
pub fn monday(hour: u32, minute: u32) -> NaiveDateTime {
    at(2024, 1, 1, hour, minute, 0)
}

/// Compare two colors with floating-point tolerance
pub fn hsb_equal(a: Hsb, b: Hsb) -> bool {
    const EPSILON: f32 = 0.001;
    (a.hue - b.hue).abs() < EPSILON
        && (a.saturation - b.saturation).abs() < EPSILON
        && (a.brightness - b.brightness).abs() < EPSILON
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
