//! The closed set of value-type tags and the keyword lexicon that maps
//! source-level type/kind words onto them.

/// Type tag carried by every node, plus the declared type of globals and
/// scripts. Numeric values are externally visible and are expected to
/// match the target engine's script-tag encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum ValueType {
    /// Not yet resolved. Never present after a successful compile.
    Unparsed = 0,
    /// Marker for the special forms (`set`, `=`, `!=`) during parsing.
    SpecialForm,
    /// Marker for a call node's function-name leaf.
    FunctionName,
    /// "Inherit the caller's preferred type." Never present after a
    /// successful compile.
    Passthrough,
    Void,
    Boolean,
    Real,
    Short,
    Long,
    String,
    Script,

    Object,
    ObjectName,
    ObjectList,
    Unit,
    UnitName,
    Vehicle,
    VehicleName,
    Weapon,
    WeaponName,
    Device,
    DeviceName,
    DeviceGroup,
    Scenery,
    SceneryName,
    EffectScenery,
    EffectSceneryName,
    TriggerVolume,
    CutsceneFlag,
    CutsceneCameraPoint,
    CutsceneTitle,
    Ai,
    AiCommandList,
    AiCommandListName,
    StartingProfile,
    ActorType,
    ActorVariant,
    ActorVariantName,
    HudMessage,
    Sound,
    SoundName,
    Effect,
    EffectName,
    Damage,
    DamageRegion,
    GameDifficulty,
    Team,
    Navpoint,
    Spline,
    Model,
    AnimationGraph,
    TagReference,
    ZoneSet,
    Conversation,
    Widget,
    WidgetName,
}

impl ValueType {
    /// Parse a lowercase source keyword (as written after `global` or as a
    /// parameter type in the definition catalogue) into a `ValueType`.
    pub fn from_keyword(word: &str) -> Option<ValueType> {
        use ValueType::*;
        Some(match word {
            "void" => Void,
            "boolean" => Boolean,
            "real" => Real,
            "short" => Short,
            "long" => Long,
            "string" => String,
            "script" => Script,

            "object" => Object,
            "object_name" => ObjectName,
            "object_list" => ObjectList,
            "unit" => Unit,
            "unit_name" => UnitName,
            "vehicle" => Vehicle,
            "vehicle_name" => VehicleName,
            "weapon" => Weapon,
            "weapon_name" => WeaponName,
            "device" => Device,
            "device_name" => DeviceName,
            "device_group" => DeviceGroup,
            "scenery" => Scenery,
            "scenery_name" => SceneryName,
            "effect_scenery" => EffectScenery,
            "effect_scenery_name" => EffectSceneryName,
            "trigger_volume" => TriggerVolume,
            "cutscene_flag" => CutsceneFlag,
            "cutscene_camera_point" => CutsceneCameraPoint,
            "cutscene_title" => CutsceneTitle,
            "ai" => Ai,
            "ai_command_list" => AiCommandList,
            "ai_command_list_name" => AiCommandListName,
            "starting_profile" => StartingProfile,
            "actor_type" => ActorType,
            "actor_variant" => ActorVariant,
            "actor_variant_name" => ActorVariantName,
            "hud_message" => HudMessage,
            "sound" => Sound,
            "sound_name" => SoundName,
            "effect" => Effect,
            "effect_name" => EffectName,
            "damage" => Damage,
            "damage_region" => DamageRegion,
            "game_difficulty" => GameDifficulty,
            "team" => Team,
            "navpoint" => Navpoint,
            "spline" => Spline,
            "model" => Model,
            "animation_graph" => AnimationGraph,
            "tag_reference" => TagReference,
            "zone_set" => ZoneSet,
            "conversation" => Conversation,
            "widget" => Widget,
            "widget_name" => WidgetName,

            // Only reachable from the definitions catalogue, never from
            // user source: a global/script declaration cannot spell these.
            "passthrough" => Passthrough,

            _ => return None,
        })
    }

    /// Render as the source keyword that would re-parse to this type, where
    /// one exists (not true of the parser-internal markers).
    pub fn as_keyword(&self) -> &'static str {
        use ValueType::*;
        match self {
            Unparsed => "unparsed",
            SpecialForm => "special_form",
            FunctionName => "function_name",
            Passthrough => "passthrough",
            Void => "void",
            Boolean => "boolean",
            Real => "real",
            Short => "short",
            Long => "long",
            String => "string",
            Script => "script",
            Object => "object",
            ObjectName => "object_name",
            ObjectList => "object_list",
            Unit => "unit",
            UnitName => "unit_name",
            Vehicle => "vehicle",
            VehicleName => "vehicle_name",
            Weapon => "weapon",
            WeaponName => "weapon_name",
            Device => "device",
            DeviceName => "device_name",
            DeviceGroup => "device_group",
            Scenery => "scenery",
            SceneryName => "scenery_name",
            EffectScenery => "effect_scenery",
            EffectSceneryName => "effect_scenery_name",
            TriggerVolume => "trigger_volume",
            CutsceneFlag => "cutscene_flag",
            CutsceneCameraPoint => "cutscene_camera_point",
            CutsceneTitle => "cutscene_title",
            Ai => "ai",
            AiCommandList => "ai_command_list",
            AiCommandListName => "ai_command_list_name",
            StartingProfile => "starting_profile",
            ActorType => "actor_type",
            ActorVariant => "actor_variant",
            ActorVariantName => "actor_variant_name",
            HudMessage => "hud_message",
            Sound => "sound",
            SoundName => "sound_name",
            Effect => "effect",
            EffectName => "effect_name",
            Damage => "damage",
            DamageRegion => "damage_region",
            GameDifficulty => "game_difficulty",
            Team => "team",
            Navpoint => "navpoint",
            Spline => "spline",
            Model => "model",
            AnimationGraph => "animation_graph",
            TagReference => "tag_reference",
            ZoneSet => "zone_set",
            Conversation => "conversation",
            Widget => "widget",
            WidgetName => "widget_name",
        }
    }

    /// Whether an `OBJECT`/`OBJECT_LIST`-preferred conversion accepts this
    /// type (see the conversion lattice in the type resolver).
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            ValueType::Object
                | ValueType::Unit
                | ValueType::Weapon
                | ValueType::Scenery
                | ValueType::Vehicle
                | ValueType::Device
        )
    }

    pub fn is_object_or_object_list(&self) -> bool {
        matches!(self, ValueType::Object | ValueType::ObjectList)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_keyword())
    }
}

/// Script lifecycle/kind tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum ScriptType {
    Startup,
    Dormant,
    Continuous,
    Static,
    Stub,
}

impl ScriptType {
    /// Whether this script type always returns `void` and has no declared
    /// return type in source (i.e. `<return-type>` is omitted).
    pub fn always_returns_void(&self) -> bool {
        !matches!(self, ScriptType::Static | ScriptType::Stub)
    }

    pub fn from_keyword(word: &str) -> Option<ScriptType> {
        match word {
            "startup" => Some(ScriptType::Startup),
            "dormant" => Some(ScriptType::Dormant),
            "continuous" => Some(ScriptType::Continuous),
            "static" => Some(ScriptType::Static),
            "stub" => Some(ScriptType::Stub),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> &'static str {
        match self {
            ScriptType::Startup => "startup",
            ScriptType::Dormant => "dormant",
            ScriptType::Continuous => "continuous",
            ScriptType::Static => "static",
            ScriptType::Stub => "stub",
        }
    }
}

/// Which engine variant's column of the definition catalogue is consulted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CompileTarget {
    /// Skip engine-presence filtering entirely; any cataloged name matches.
    Any,
    Xbox,
    GearboxRetail,
    GearboxDemo,
    GearboxCustomEdition,
    MccCea,
}

/// How aggressively the tree builder elides implicit `begin` wrappers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OptimizationLevel {
    Paranoid = 0,
    PreventGenerationalLoss = 1,
    DedupeExtra = 2,
    Aggressive = 3,
}

/// Byte codec for decoding source text and any string-typed node payload
/// handed back across the instance boundary. Additive relative to the
/// distilled spec; UTF-8 remains the default.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CompileEncoding {
    #[default]
    Utf8,
    Windows1252,
}

impl CompileEncoding {
    pub fn decode(&self, bytes: &[u8]) -> Result<String, std::string::FromUtf8Error> {
        match self {
            CompileEncoding::Utf8 => String::from_utf8(bytes.to_vec()),
            CompileEncoding::Windows1252 => {
                use encoding::all::WINDOWS_1252;
                use encoding::{DecoderTrap, Encoding};
                Ok(WINDOWS_1252
                    .decode(bytes, DecoderTrap::Replace)
                    .expect("WINDOWS_1252 decode with Replace trap never errors"))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn keyword_roundtrip() {
        for word in ["short", "long", "real", "boolean", "string", "object", "unit_name", "team"] {
            let ty = ValueType::from_keyword(word).unwrap();
            assert_eq!(ty.as_keyword(), word);
        }
    }

    #[test]
    fn unknown_keyword_rejected() {
        assert!(ValueType::from_keyword("not_a_type").is_none());
    }

    #[test]
    fn object_like_accepts_subtypes() {
        assert!(ValueType::Unit.is_object_like());
        assert!(ValueType::Vehicle.is_object_like());
        assert!(!ValueType::Real.is_object_like());
    }
}
