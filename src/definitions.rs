//! The built-in definition catalogue: a static, name-sorted table of engine
//! functions and globals, generated at compile time by the sibling
//! `scriptc-definitions` proc-macro crate from a bundled JSON file. The
//! catalogue's contents are data (out of scope for this crate's own
//! design); only the lookup contract below is specified behavior.

extern crate scriptc_definitions;
use self::scriptc_definitions::generate_definitions;

use crate::value_type::{CompileTarget, ValueType};

/// One engine-specific presence slot. `NotPresent` is the sentinel that the
/// lookup contract tests against; `Unknown` means "unverified, but not
/// confirmed absent" and is treated as present.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum EngineIndex {
    Present(u16),
    Unknown,
    NotPresent,
}

impl EngineIndex {
    fn is_present(&self) -> bool {
        !matches!(self, EngineIndex::NotPresent)
    }
}

pub(crate) struct EngineAvailability {
    pub xbox: EngineIndex,
    pub gbx_retail: EngineIndex,
    pub gbx_demo: EngineIndex,
    pub gbx_custom: EngineIndex,
    pub mcc_cea: EngineIndex,
}

impl EngineAvailability {
    /// Step 3 of the lookup contract: `target == Any` always passes: engine
    /// presence is not consulted at all for the wildcard target.
    pub(crate) fn supports_target(&self, target: CompileTarget) -> bool {
        match target {
            CompileTarget::Any => true,
            CompileTarget::Xbox => self.xbox.is_present(),
            CompileTarget::GearboxRetail => self.gbx_retail.is_present(),
            CompileTarget::GearboxDemo => self.gbx_demo.is_present(),
            CompileTarget::GearboxCustomEdition => self.gbx_custom.is_present(),
            CompileTarget::MccCea => self.mcc_cea.is_present(),
        }
    }

    /// Whether the entry is known on at least one engine variant other than
    /// `target`; used to produce the "defined on another engine" diagnostic
    /// hint.
    pub(crate) fn supports_any_other_target(&self, target: CompileTarget) -> bool {
        [
            CompileTarget::Xbox,
            CompileTarget::GearboxRetail,
            CompileTarget::GearboxDemo,
            CompileTarget::GearboxCustomEdition,
            CompileTarget::MccCea,
        ]
        .into_iter()
        .filter(|t| *t != target)
        .any(|t| self.supports_target(t))
    }
}

pub(crate) struct EngineFunctionParameter {
    pub value_type: ValueType,
    pub many: bool,
    pub optional: bool,
    pub allow_uppercase: bool,
    pub passthrough_last: bool,
}

pub(crate) struct EngineFunction {
    pub name: &'static str,
    pub return_type: ValueType,
    pub availability: EngineAvailability,
    pub parameters: &'static [EngineFunctionParameter],
}

impl EngineFunction {
    pub(crate) fn minimum_parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .position(|p| p.optional)
            .unwrap_or(self.parameters.len())
    }

    pub(crate) fn maximum_parameter_count(&self) -> usize {
        if self.parameters.last().is_some_and(|p| p.many) {
            usize::MAX
        } else {
            self.parameters.len()
        }
    }

    /// Parameter descriptor for argument position `index`, accounting for a
    /// variadic (`many`) final parameter that repeats for every extra
    /// argument.
    pub(crate) fn parameter_at(&self, index: usize) -> Option<&EngineFunctionParameter> {
        match self.parameters.len() {
            0 => None,
            n if index < n => Some(&self.parameters[index]),
            n => {
                let last = &self.parameters[n - 1];
                if last.many {
                    Some(last)
                } else {
                    None
                }
            }
        }
    }
}

pub(crate) struct EngineGlobal {
    pub name: &'static str,
    pub value_type: ValueType,
    pub availability: EngineAvailability,
}

generate_definitions!();

/// Binary-search `ALL_FUNCTIONS` by name, filtered by `target` per the
/// catalogue lookup contract (name match is case-sensitive).
pub(crate) fn lookup_function(name: &str, target: CompileTarget) -> Option<&'static EngineFunction> {
    let index = ALL_FUNCTIONS.binary_search_by(|f| f.name.cmp(name)).ok()?;
    let entry = &ALL_FUNCTIONS[index];
    if target != CompileTarget::Any && !entry.availability.supports_target(target) {
        return None;
    }
    Some(entry)
}

/// As `lookup_function`, ignoring target presence - used to produce the
/// "defined on another engine variant" diagnostic hint.
pub(crate) fn lookup_function_any_target(name: &str) -> Option<&'static EngineFunction> {
    let index = ALL_FUNCTIONS.binary_search_by(|f| f.name.cmp(name)).ok()?;
    Some(&ALL_FUNCTIONS[index])
}

pub(crate) fn lookup_global(name: &str, target: CompileTarget) -> Option<&'static EngineGlobal> {
    let index = ALL_GLOBALS.binary_search_by(|g| g.name.cmp(name)).ok()?;
    let entry = &ALL_GLOBALS[index];
    if target != CompileTarget::Any && !entry.availability.supports_target(target) {
        return None;
    }
    Some(entry)
}

pub(crate) fn lookup_global_any_target(name: &str) -> Option<&'static EngineGlobal> {
    let index = ALL_GLOBALS.binary_search_by(|g| g.name.cmp(name)).ok()?;
    Some(&ALL_GLOBALS[index])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn catalogue_is_sorted_by_name() {
        assert!(ALL_FUNCTIONS.windows(2).all(|w| w[0].name < w[1].name));
        assert!(ALL_GLOBALS.windows(2).all(|w| w[0].name < w[1].name));
    }

    #[test]
    fn lookup_any_bypasses_presence() {
        // `deprecated_game_reset` only carries an Xbox slot.
        assert!(lookup_function("deprecated_game_reset", CompileTarget::Any).is_some());
        assert!(lookup_function("deprecated_game_reset", CompileTarget::MccCea).is_none());
        assert!(lookup_function("deprecated_game_reset", CompileTarget::Xbox).is_some());
    }

    #[test]
    fn unknown_name_not_found() {
        assert!(lookup_function("definitely_not_a_function", CompileTarget::Any).is_none());
    }

    #[test]
    fn begin_is_passthrough_variadic() {
        let f = lookup_function("begin", CompileTarget::Any).unwrap();
        assert_eq!(f.return_type, ValueType::Passthrough);
        assert_eq!(f.minimum_parameter_count(), 0);
        assert_eq!(f.maximum_parameter_count(), usize::MAX);
        assert!(f.parameters[0].passthrough_last);
    }
}
