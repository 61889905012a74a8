//! Component tags and payloads.
//!
//! A component is addressed by a string tag ([`ComponentId`]) and carries one
//! value of the closed sum type [`Component`]. The store is heterogeneous:
//! different tags hold different variants, and nothing ties a tag to a
//! variant except the code that writes it. Systems read payloads through the
//! typed accessors (`as_vec2`, `as_flag`, ...) or the `expect_*` helpers that
//! turn a variant mismatch into an [`EcsError`].

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// String tag naming a component slot, e.g. `"position"` or `"dead"`.
///
/// Static tags are stored without allocating. The type borrows as `str`, so
/// maps keyed by `ComponentId` can be probed with plain string slices.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(Cow<'static, str>);

impl ComponentId {
    /// A tag backed by a static string.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for ComponentId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for ComponentId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&ComponentId> for ComponentId {
    fn from(id: &ComponentId) -> Self {
        id.clone()
    }
}

impl Borrow<str> for ComponentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({:?})", self.as_str())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// A 2D vector used for positions, speeds, velocities and sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing `degrees` counter-clockwise from +x.
    pub fn from_angle_degrees(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { x: cos, y: sin }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from a top-left corner and a size.
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Whether `other` lies entirely inside `self` (edges inclusive).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

/// A timer counting down simulated seconds.
///
/// The countdown is advanced by the frame's `dt`, never by the wall clock,
/// so a simulation replays identically for identical `dt` sequences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    duration: f32,
    remaining: f32,
}

impl Countdown {
    /// A countdown that goes cold after `duration` seconds.
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(0.0);
        Self {
            duration,
            remaining: duration,
        }
    }

    /// Advance by `dt` seconds. Remaining time saturates at zero.
    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    /// `true` once the full duration has elapsed.
    pub fn is_cold(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Restart from the full duration.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
    }
}

/// Opaque handle to an image owned by the host renderer.
///
/// Only the pixel size is visible to systems (for boundary math); the pixels
/// themselves never enter the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageHandle {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageHandle {
    pub const fn new(id: u32, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Opaque handle to a sound owned by the host audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundHandle(pub u32);

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A component payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Vec2(Vec2),
    Countdown(Countdown),
    Flag(bool),
    Image(ImageHandle),
    Sound(SoundHandle),
    Label(String),
    Rect(Rect),
}

macro_rules! accessors {
    ($( $variant:ident : $ty:ty => $as_ref:ident, $as_mut:ident, $expect:ident, $expect_mut:ident; )*) => {
        impl Component {
            $(
                #[doc = concat!("Borrow the payload if this is a `", stringify!($variant), "`.")]
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        Component::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                #[doc = concat!("Mutably borrow the payload if this is a `", stringify!($variant), "`.")]
                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Component::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                #[doc = concat!("Like [`", stringify!($as_ref), "`](Self::", stringify!($as_ref), "), reporting a mismatch as [`EcsError::ComponentKind`].")]
                pub fn $expect(&self, entity: EntityId, component: &str) -> Result<&$ty, EcsError> {
                    let found = self.kind();
                    self.$as_ref().ok_or_else(|| EcsError::ComponentKind {
                        entity,
                        component: component.to_owned(),
                        expected: stringify!($variant),
                        found,
                    })
                }

                #[doc = concat!("Like [`", stringify!($as_mut), "`](Self::", stringify!($as_mut), "), reporting a mismatch as [`EcsError::ComponentKind`].")]
                pub fn $expect_mut(&mut self, entity: EntityId, component: &str) -> Result<&mut $ty, EcsError> {
                    let found = self.kind();
                    self.$as_mut().ok_or_else(|| EcsError::ComponentKind {
                        entity,
                        component: component.to_owned(),
                        expected: stringify!($variant),
                        found,
                    })
                }
            )*
        }
    };
}

accessors! {
    Vec2: Vec2 => as_vec2, as_vec2_mut, expect_vec2, expect_vec2_mut;
    Countdown: Countdown => as_countdown, as_countdown_mut, expect_countdown, expect_countdown_mut;
    Flag: bool => as_flag, as_flag_mut, expect_flag, expect_flag_mut;
    Image: ImageHandle => as_image, as_image_mut, expect_image, expect_image_mut;
    Sound: SoundHandle => as_sound, as_sound_mut, expect_sound, expect_sound_mut;
    Label: String => as_label, as_label_mut, expect_label, expect_label_mut;
    Rect: Rect => as_rect, as_rect_mut, expect_rect, expect_rect_mut;
}

impl Component {
    /// Name of the active variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Vec2(_) => "Vec2",
            Component::Countdown(_) => "Countdown",
            Component::Flag(_) => "Flag",
            Component::Image(_) => "Image",
            Component::Sound(_) => "Sound",
            Component::Label(_) => "Label",
            Component::Rect(_) => "Rect",
        }
    }

    /// `true` only for `Flag(true)`. Any other payload reads as unset.
    pub fn is_set(&self) -> bool {
        matches!(self, Component::Flag(true))
    }
}

impl From<Vec2> for Component {
    fn from(v: Vec2) -> Self {
        Component::Vec2(v)
    }
}

impl From<Countdown> for Component {
    fn from(v: Countdown) -> Self {
        Component::Countdown(v)
    }
}

impl From<bool> for Component {
    fn from(v: bool) -> Self {
        Component::Flag(v)
    }
}

impl From<ImageHandle> for Component {
    fn from(v: ImageHandle) -> Self {
        Component::Image(v)
    }
}

impl From<SoundHandle> for Component {
    fn from(v: SoundHandle) -> Self {
        Component::Sound(v)
    }
}

impl From<String> for Component {
    fn from(v: String) -> Self {
        Component::Label(v)
    }
}

impl From<&str> for Component {
    fn from(v: &str) -> Self {
        Component::Label(v.to_owned())
    }
}

impl From<Rect> for Component {
    fn from(v: Rect) -> Self {
        Component::Rect(v)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
