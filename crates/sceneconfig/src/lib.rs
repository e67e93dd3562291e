//! Tunable parameters for the black hole scene.
//!
//! Every constant the scene uses (colors, radii, spin rates, light placement,
//! audio volume) lives here so it can be tweaked from `eventhorizon.toml`
//! without touching the renderer. Every field has a default, so
//! an empty file (or no file at all) renders the stock scene.

mod color;
mod de;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use color::Rgb;
pub use de::parse_antialias;

use de::{
    deserialize_antialias_opt, deserialize_duration, deserialize_duration_opt,
    serialize_antialias_opt, serialize_duration, serialize_duration_opt,
};

/// File name looked up inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "eventhorizon.toml";

/// Upper bound on point lights; matches the uniform array in the shaders.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Slowest frame cap accepted; anything lower is a typo rather than a cap.
pub const MIN_FPS: f32 = 0.1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }

    /// Explicit sample count, or `None` for `Auto`.
    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.samples() {
            None => f.write_str("auto"),
            Some(1) => f.write_str("off"),
            Some(count) => write!(f, "{count}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneMapping {
    #[default]
    Aces,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    #[default]
    Auto,
    Gamma,
    Linear,
}

/// How the accretion disk is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskMaterial {
    /// Custom gradient/doppler shader.
    #[default]
    Shader,
    /// Lit material using the scene lights and an emissive gradient midpoint.
    Standard,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SceneConfig {
    pub version: u32,
    pub render: RenderSettings,
    pub camera: CameraSettings,
    pub animation: AnimationSettings,
    pub starfield: StarfieldSettings,
    pub black_hole: BlackHoleSettings,
    pub disk: DiskSettings,
    pub glow: GlowSettings,
    pub lensing: LensingSettings,
    pub shells: ShellSettings,
    pub lights: Vec<PointLightSettings>,
    pub ambient_light: AmbientLightSettings,
    pub audio: AudioSettings,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: 1,
            render: RenderSettings::default(),
            camera: CameraSettings::default(),
            animation: AnimationSettings::default(),
            starfield: StarfieldSettings::default(),
            black_hole: BlackHoleSettings::default(),
            disk: DiskSettings::default(),
            glow: GlowSettings::default(),
            lensing: LensingSettings::default(),
            shells: ShellSettings::default(),
            lights: default_lights(),
            ambient_light: AmbientLightSettings::default(),
            audio: AudioSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Frame cap; `None` or `0` renders every vsync.
    pub fps: Option<f32>,
    #[serde(
        deserialize_with = "deserialize_antialias_opt",
        serialize_with = "serialize_antialias_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub antialias: Option<AntialiasSetting>,
    pub exposure: f32,
    pub tone_mapping: ToneMapping,
    pub color_space: ColorSpaceSetting,
    pub clear_color: Rgb,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            fps: None,
            antialias: None,
            exposure: 0.8,
            tone_mapping: ToneMapping::Aces,
            color_space: ColorSpaceSetting::Auto,
            clear_color: Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub drift: DriftSettings,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 8.0, 20.0],
            target: [0.0, 0.0, 0.0],
            min_distance: 3.0,
            max_distance: 200.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            drift: DriftSettings::default(),
        }
    }
}

/// Slow sinusoidal offset applied to the camera eye, driven by shader time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriftSettings {
    pub enabled: bool,
    /// Peak offset along x and y.
    pub amplitude: [f32; 2],
    /// Angular frequency along x and y, per unit of shader time.
    pub frequency: [f32; 2],
}

impl Default for DriftSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            amplitude: [2.0, 0.5],
            frequency: [0.1, 0.15],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Shader time advanced per wall-clock second.
    pub time_scale: f32,
    /// Step every frame by this amount instead of measuring wall-clock time.
    #[serde(
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_step: Option<Duration>,
    /// Largest wall-clock step fed into the animator after a stall.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub max_step: Duration,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            time_scale: 0.6,
            fixed_step: None,
            max_step: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StarfieldSettings {
    pub count: u32,
    /// Edge length of the cube the stars are scattered in.
    pub extent: f32,
    pub color: Rgb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for StarfieldSettings {
    fn default() -> Self {
        Self {
            count: 10_000,
            extent: 2000.0,
            color: Rgb::WHITE,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BlackHoleSettings {
    /// Base scale; every radius below is a multiple of it.
    pub size: f32,
    /// Horizon radius as a multiple of `size`.
    pub horizon_radius: f32,
    pub horizon_color: Rgb,
    pub horizon_opacity: f32,
    pub horizon_segments: u32,
}

impl Default for BlackHoleSettings {
    fn default() -> Self {
        Self {
            size: 3.0,
            horizon_radius: 0.5,
            horizon_color: Rgb::BLACK,
            horizon_opacity: 0.95,
            horizon_segments: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskSettings {
    pub inner: f32,
    pub outer: f32,
    pub segments: u32,
    pub tilt_degrees: f32,
    /// Rotation about the disk normal, radians per second.
    pub spin: f32,
    pub material: DiskMaterial,
    pub inner_color: Rgb,
    pub outer_color: Rgb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid_color: Option<Rgb>,
    pub glow_speed: f32,
    pub glow_frequency: f32,
    pub doppler_strength: f32,
    /// Brightness lost between the inner and outer edge, in `[0, 1]`.
    pub falloff: f32,
}

impl Default for DiskSettings {
    fn default() -> Self {
        Self {
            inner: 0.6,
            outer: 1.8,
            segments: 180,
            tilt_degrees: 60.0,
            spin: 0.06,
            material: DiskMaterial::Shader,
            inner_color: Rgb::from_hex(0x4444ff),
            outer_color: Rgb::from_hex(0xff4400),
            mid_color: None,
            glow_speed: 2.0,
            glow_frequency: 10.0,
            doppler_strength: 0.35,
            falloff: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlowSettings {
    pub enabled: bool,
    pub inner: f32,
    pub outer: f32,
    pub segments: u32,
    pub color: Rgb,
    pub opacity: f32,
    pub spin: f32,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            inner: 0.55,
            outer: 2.0,
            segments: 180,
            color: Rgb::from_hex(0xff6600),
            opacity: 0.1,
            spin: -0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LensingSettings {
    pub einstein_ring: EinsteinRingSettings,
    pub arcs: ArcSettings,
}

impl Default for LensingSettings {
    fn default() -> Self {
        Self {
            einstein_ring: EinsteinRingSettings::default(),
            arcs: ArcSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EinsteinRingSettings {
    pub enabled: bool,
    pub radius: f32,
    pub thickness: f32,
    pub segments: u32,
    pub color: Rgb,
    pub opacity: f32,
    pub spin: f32,
}

impl Default for EinsteinRingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.75,
            thickness: 0.06,
            segments: 180,
            color: Rgb::from_hex(0xffd9a0),
            opacity: 0.6,
            spin: 0.018,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArcSettings {
    pub count: u32,
    pub radius: f32,
    pub thickness: f32,
    pub span_degrees: f32,
    pub tilt_degrees: f32,
    pub segments: u32,
    pub color: Rgb,
    pub opacity: f32,
    pub spin: f32,
}

impl Default for ArcSettings {
    fn default() -> Self {
        Self {
            count: 2,
            radius: 1.0,
            thickness: 0.05,
            span_degrees: 140.0,
            tilt_degrees: 80.0,
            segments: 96,
            color: Rgb::from_hex(0xffb070),
            opacity: 0.35,
            spin: 0.02,
        }
    }
}

/// Concentric back-faced spheres that give the horizon a soft halo.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellSettings {
    pub count: u32,
    pub base_radius: f32,
    pub step: f32,
    pub segments: u32,
    pub color: Rgb,
    pub opacity: f32,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            count: 2,
            base_radius: 0.56,
            step: 0.08,
            segments: 48,
            color: Rgb::from_hex(0xff7a1a),
            opacity: 0.06,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PointLightSettings {
    pub color: Rgb,
    pub intensity: f32,
    pub position: [f32; 3],
}

fn default_lights() -> Vec<PointLightSettings> {
    vec![
        PointLightSettings {
            color: Rgb::from_hex(0xff8800),
            intensity: 2.0,
            position: [0.0, 2.0, 0.0],
        },
        PointLightSettings {
            color: Rgb::from_hex(0x4444ff),
            intensity: 1.0,
            position: [0.0, -2.0, 0.0],
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AmbientLightSettings {
    pub color: Rgb,
    pub intensity: f32,
}

impl Default for AmbientLightSettings {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            intensity: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    /// Looping track; falls back to `<data_dir>/ambient-space.mp3` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<PathBuf>,
    /// Master gain in `[0, 1]`.
    pub volume: f32,
    /// Drone voices synthesized when the track is unavailable.
    pub tones: Vec<ToneSettings>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            track: None,
            volume: 0.15,
            tones: vec![
                ToneSettings {
                    frequency: 55.0,
                    gain: 0.5,
                },
                ToneSettings {
                    frequency: 82.41,
                    gain: 0.3,
                },
                ToneSettings {
                    frequency: 110.0,
                    gain: 0.2,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToneSettings {
    pub frequency: f32,
    pub gain: f32,
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        self.check_finite()?;

        let render = &self.render;
        if let Some(fps) = render.fps {
            if fps < 0.0 {
                return Err(invalid("render.fps must be >= 0"));
            }
            if fps > 0.0 && fps < MIN_FPS {
                return Err(invalid(format!(
                    "render.fps must be 0 (uncapped) or at least {MIN_FPS}"
                )));
            }
        }
        if render.exposure <= 0.0 {
            return Err(invalid("render.exposure must be > 0"));
        }

        let camera = &self.camera;
        if !(1.0..179.0).contains(&camera.fov) {
            return Err(invalid("camera.fov must be between 1 and 179 degrees"));
        }
        if camera.near <= 0.0 || camera.far <= camera.near {
            return Err(invalid("camera clip planes must satisfy 0 < near < far"));
        }
        if camera.min_distance <= 0.0 || camera.max_distance < camera.min_distance {
            return Err(invalid(
                "camera distances must satisfy 0 < min_distance <= max_distance",
            ));
        }

        if self.animation.time_scale < 0.0 {
            return Err(invalid("animation.time_scale must be >= 0"));
        }
        if self.animation.max_step.is_zero() {
            return Err(invalid("animation.max_step must be greater than zero"));
        }
        if matches!(self.animation.fixed_step, Some(step) if step.is_zero()) {
            return Err(invalid("animation.fixed_step must be greater than zero"));
        }

        if self.starfield.extent <= 0.0 {
            return Err(invalid("starfield.extent must be > 0"));
        }

        let hole = &self.black_hole;
        positive("black_hole.size", hole.size)?;
        positive("black_hole.horizon_radius", hole.horizon_radius)?;
        unit_interval("black_hole.horizon_opacity", hole.horizon_opacity)?;
        if hole.horizon_segments < 3 {
            return Err(invalid("black_hole.horizon_segments must be >= 3"));
        }

        let disk = &self.disk;
        ring_bounds("disk", disk.inner, disk.outer, disk.segments)?;
        unit_interval("disk.falloff", disk.falloff)?;
        if disk.doppler_strength < 0.0 {
            return Err(invalid("disk.doppler_strength must be >= 0"));
        }

        let glow = &self.glow;
        if glow.enabled {
            ring_bounds("glow", glow.inner, glow.outer, glow.segments)?;
            unit_interval("glow.opacity", glow.opacity)?;
        }

        let ring = &self.lensing.einstein_ring;
        if ring.enabled {
            positive("lensing.einstein_ring.radius", ring.radius)?;
            positive("lensing.einstein_ring.thickness", ring.thickness)?;
            ring_bounds(
                "lensing.einstein_ring",
                ring.radius - ring.thickness * 0.5,
                ring.radius + ring.thickness * 0.5,
                ring.segments,
            )?;
            unit_interval("lensing.einstein_ring.opacity", ring.opacity)?;
        }

        let arcs = &self.lensing.arcs;
        if arcs.count > 0 {
            positive("lensing.arcs.radius", arcs.radius)?;
            positive("lensing.arcs.thickness", arcs.thickness)?;
            ring_bounds(
                "lensing.arcs",
                arcs.radius - arcs.thickness * 0.5,
                arcs.radius + arcs.thickness * 0.5,
                arcs.segments,
            )?;
            if !(0.0..=360.0).contains(&arcs.span_degrees) || arcs.span_degrees == 0.0 {
                return Err(invalid("lensing.arcs.span_degrees must be in (0, 360]"));
            }
            unit_interval("lensing.arcs.opacity", arcs.opacity)?;
        }

        let shells = &self.shells;
        if shells.count > 0 {
            positive("shells.base_radius", shells.base_radius)?;
            if shells.step < 0.0 {
                return Err(invalid("shells.step must be >= 0"));
            }
            if shells.segments < 3 {
                return Err(invalid("shells.segments must be >= 3"));
            }
            unit_interval("shells.opacity", shells.opacity)?;
        }

        if self.lights.len() > MAX_POINT_LIGHTS {
            return Err(invalid(format!(
                "at most {MAX_POINT_LIGHTS} point lights are supported (found {})",
                self.lights.len()
            )));
        }
        for (index, light) in self.lights.iter().enumerate() {
            if light.intensity < 0.0 {
                return Err(invalid(format!("lights[{index}].intensity must be >= 0")));
            }
        }
        if self.ambient_light.intensity < 0.0 {
            return Err(invalid("ambient_light.intensity must be >= 0"));
        }

        unit_interval("audio.volume", self.audio.volume)?;
        for (index, tone) in self.audio.tones.iter().enumerate() {
            if tone.frequency <= 0.0 {
                return Err(invalid(format!("audio.tones[{index}].frequency must be > 0")));
            }
            unit_interval(&format!("audio.tones[{index}].gain"), tone.gain)?;
        }

        Ok(())
    }
}

impl SceneConfig {
    /// Every float the scene reads must be finite; NaN and infinity slip past
    /// the range checks below and blow up later in geometry or sampling.
    fn check_finite(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        let disk = &self.disk;
        let glow = &self.glow;
        let ring = &self.lensing.einstein_ring;
        let arcs = &self.lensing.arcs;
        let shells = &self.shells;

        let mut fields: Vec<(String, f32)> = vec![
            ("render.exposure".into(), self.render.exposure),
            ("camera.fov".into(), camera.fov),
            ("camera.near".into(), camera.near),
            ("camera.far".into(), camera.far),
            ("camera.min_distance".into(), camera.min_distance),
            ("camera.max_distance".into(), camera.max_distance),
            ("camera.rotate_speed".into(), camera.rotate_speed),
            ("camera.zoom_speed".into(), camera.zoom_speed),
            ("camera.pan_speed".into(), camera.pan_speed),
            ("animation.time_scale".into(), self.animation.time_scale),
            ("starfield.extent".into(), self.starfield.extent),
            ("black_hole.size".into(), self.black_hole.size),
            ("black_hole.horizon_radius".into(), self.black_hole.horizon_radius),
            ("black_hole.horizon_opacity".into(), self.black_hole.horizon_opacity),
            ("disk.inner".into(), disk.inner),
            ("disk.outer".into(), disk.outer),
            ("disk.tilt_degrees".into(), disk.tilt_degrees),
            ("disk.spin".into(), disk.spin),
            ("disk.glow_speed".into(), disk.glow_speed),
            ("disk.glow_frequency".into(), disk.glow_frequency),
            ("disk.doppler_strength".into(), disk.doppler_strength),
            ("disk.falloff".into(), disk.falloff),
            ("glow.inner".into(), glow.inner),
            ("glow.outer".into(), glow.outer),
            ("glow.opacity".into(), glow.opacity),
            ("glow.spin".into(), glow.spin),
            ("lensing.einstein_ring.radius".into(), ring.radius),
            ("lensing.einstein_ring.thickness".into(), ring.thickness),
            ("lensing.einstein_ring.opacity".into(), ring.opacity),
            ("lensing.einstein_ring.spin".into(), ring.spin),
            ("lensing.arcs.radius".into(), arcs.radius),
            ("lensing.arcs.thickness".into(), arcs.thickness),
            ("lensing.arcs.span_degrees".into(), arcs.span_degrees),
            ("lensing.arcs.tilt_degrees".into(), arcs.tilt_degrees),
            ("lensing.arcs.opacity".into(), arcs.opacity),
            ("lensing.arcs.spin".into(), arcs.spin),
            ("shells.base_radius".into(), shells.base_radius),
            ("shells.step".into(), shells.step),
            ("shells.opacity".into(), shells.opacity),
            ("ambient_light.intensity".into(), self.ambient_light.intensity),
            ("audio.volume".into(), self.audio.volume),
        ];
        if let Some(fps) = self.render.fps {
            fields.push(("render.fps".into(), fps));
        }
        for (axis, value) in ["x", "y", "z"].iter().zip(camera.position) {
            fields.push((format!("camera.position.{axis}"), value));
        }
        for (axis, value) in ["x", "y", "z"].iter().zip(camera.target) {
            fields.push((format!("camera.target.{axis}"), value));
        }
        for (axis, value) in ["x", "y"].iter().zip(camera.drift.amplitude) {
            fields.push((format!("camera.drift.amplitude.{axis}"), value));
        }
        for (axis, value) in ["x", "y"].iter().zip(camera.drift.frequency) {
            fields.push((format!("camera.drift.frequency.{axis}"), value));
        }
        for (index, light) in self.lights.iter().enumerate() {
            fields.push((format!("lights[{index}].intensity"), light.intensity));
            for (axis, value) in ["x", "y", "z"].iter().zip(light.position) {
                fields.push((format!("lights[{index}].position.{axis}"), value));
            }
        }
        for (index, tone) in self.audio.tones.iter().enumerate() {
            fields.push((format!("audio.tones[{index}].frequency"), tone.frequency));
            fields.push((format!("audio.tones[{index}].gain"), tone.gain));
        }

        match fields.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(invalid(format!("{field} must be finite, got {value}"))),
            None => Ok(()),
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be > 0")))
    }
}

fn unit_interval(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be within [0, 1]")))
    }
}

fn ring_bounds(section: &str, inner: f32, outer: f32, segments: u32) -> Result<(), ConfigError> {
    if inner <= 0.0 || outer <= inner {
        return Err(invalid(format!(
            "{section} radii must satisfy 0 < inner < outer"
        )));
    }
    if segments < 3 {
        return Err(invalid(format!("{section}.segments must be >= 3")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[render]
fps = 30
antialias = 4
exposure = 1.1

[animation]
time_scale = 1.2
fixed_step = "20ms"

[black_hole]
size = 2.5

[disk]
inner_color = "#3366ff"
outer_color = 0xff2200
material = "standard"

[[lights]]
color = "#ffffff"
intensity = 3.0
position = [1.0, 2.0, 3.0]

[audio]
track = "/tmp/drone.ogg"
volume = 0.4
"##;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SceneConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.lights.len(), 2);
        assert!((config.audio.volume - 0.15).abs() < f32::EPSILON);
        assert_eq!(config.disk.inner_color, Rgb::from_hex(0x4444ff));
    }

    #[test]
    fn parses_sample_config() {
        let config = SceneConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.render.fps, Some(30.0));
        assert_eq!(config.render.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(config.animation.fixed_step, Some(Duration::from_millis(20)));
        assert_eq!(config.disk.material, DiskMaterial::Standard);
        assert_eq!(config.disk.outer_color, Rgb::from_hex(0xff2200));
        assert_eq!(config.lights.len(), 1);
        assert_eq!(config.audio.track.as_deref(), Some(Path::new("/tmp/drone.ogg")));
        // untouched sections keep their defaults
        assert_eq!(config.glow, GlowSettings::default());
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let config = SceneConfig::default();
        let text = config.to_toml_string().expect("serialize");
        let parsed = SceneConfig::from_toml_str(&text).expect("reparse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SceneConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_inverted_disk_radii() {
        let err = SceneConfig::from_toml_str("[disk]\ninner = 2.0\nouter = 1.0").unwrap_err();
        assert!(err.to_string().contains("disk radii"));
    }

    #[test]
    fn rejects_opacity_outside_unit_interval() {
        let err = SceneConfig::from_toml_str("[glow]\nopacity = 1.5").unwrap_err();
        assert!(err.to_string().contains("glow.opacity"));
    }

    #[test]
    fn rejects_too_many_lights() {
        let light = "[[lights]]\ncolor = \"#ffffff\"\nintensity = 1.0\nposition = [0.0, 0.0, 0.0]\n";
        let err = SceneConfig::from_toml_str(&light.repeat(MAX_POINT_LIGHTS + 1)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_bad_color_and_duration() {
        assert!(SceneConfig::from_toml_str("[disk]\ninner_color = \"blue\"").is_err());
        assert!(SceneConfig::from_toml_str("[animation]\nmax_step = \"soon\"").is_err());
        assert!(SceneConfig::from_toml_str("[animation]\nfixed_step = \"0ms\"").is_err());
    }

    #[test]
    fn rejects_non_finite_floats() {
        for input in [
            "[starfield]\nextent = inf\ncount = 4",
            "[starfield]\nextent = nan",
            "[render]\nexposure = nan",
            "[camera]\nfar = inf",
            "[disk]\nspin = -inf",
            "[animation]\ntime_scale = nan",
            "[render]\nfps = inf",
            "[[lights]]\ncolor = \"#ffffff\"\nintensity = 1.0\nposition = [0.0, nan, 0.0]",
        ] {
            let err = SceneConfig::from_toml_str(input).unwrap_err();
            assert!(
                err.to_string().contains("must be finite"),
                "{input:?} gave {err}"
            );
        }
    }

    #[test]
    fn rejects_fps_cap_too_small_to_schedule() {
        let err = SceneConfig::from_toml_str("[render]\nfps = 1e-30").unwrap_err();
        assert!(err.to_string().contains("render.fps"));
        assert!(SceneConfig::from_toml_str("[render]\nfps = 0").is_ok());
        assert!(SceneConfig::from_toml_str("[render]\nfps = 0.5").is_ok());
    }

    #[test]
    fn out_of_range_durations_are_parse_errors() {
        for input in ["[animation]\nfixed_step = 1e30", "[animation]\nmax_step = 1e30"] {
            let err = SceneConfig::from_toml_str(input).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{input:?} gave {err}");
        }
        let config = SceneConfig::from_toml_str("[animation]\nfixed_step = 0.02").unwrap();
        assert_eq!(
            config.animation.fixed_step,
            Some(std::time::Duration::from_millis(20))
        );
    }

    #[test]
    fn antialias_display_round_trips() {
        for setting in [
            AntialiasSetting::Auto,
            AntialiasSetting::Off,
            AntialiasSetting::Samples8,
        ] {
            assert_eq!(parse_antialias(&setting.to_string()), Ok(setting));
        }
    }

    #[test]
    fn load_or_default_handles_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = SceneConfig::load_or_default(&path).expect("defaults");
        assert_eq!(config, SceneConfig::default());

        std::fs::write(&path, "[starfield]\ncount = 12\nseed = 7\n").expect("write config");
        let config = SceneConfig::load_or_default(&path).expect("load");
        assert_eq!(config.starfield.count, 12);
        assert_eq!(config.starfield.seed, Some(7));
    }
}
