//! The type resolver (§4.4): walks every script's and global's root node,
//! pushing a declared preferred type downward and pulling an inferred type
//! upward, then runs the post-resolution passes that only make sense once
//! every node in the graph has a final type — stub/static replacement,
//! `UNPARSED` compaction, and script-call index back-fill.
//!
//! Grounded on `riat_tree.c`'s `resolve_type_of_element`/
//! `resolve_type_of_block` (the original C implementation) and the teacher's
//! owned-tree generation (`src/compile/mod.rs`), adapted to the arena+index
//! node model this crate uses instead of an owned tree.

use crate::declarations::{Global, Script};
use crate::definitions::{self, EngineFunction};
use crate::error::{CompileError, CompileResult, WarningKind};
use crate::node::{NodeArena, NodeData, NodeIndex};
use crate::value_type::{CompileTarget, ScriptType, ValueType};

pub(crate) type WarnFn<'a> = dyn FnMut(&str, &str, usize, usize) + 'a;

fn file_name<'a>(files: &'a [String], index: usize) -> &'a str {
    files.get(index).map(|s| s.as_str()).unwrap_or("<unknown>")
}

fn err_at(files: &[String], file: usize, line: usize, column: usize, message: impl Into<String>) -> CompileError {
    CompileError::syntax(file_name(files, file), line, column, message)
}

/// Run every pass of §4.4 in order, mutating `arena`, `scripts`, and
/// `globals` in place. `warn` is invoked for the one contractual warning
/// (script/global name collision).
pub(crate) fn resolve(
    arena: &mut NodeArena,
    scripts: &mut Vec<Script>,
    globals: &mut Vec<Global>,
    target: CompileTarget,
    files: &[String],
    warn: &mut WarnFn,
) -> CompileResult<()> {
    for g in globals.iter() {
        resolve_element(arena, g.first_node, g.value_type, false, scripts, globals, target, files)?;
    }
    for s in scripts.iter() {
        resolve_element(arena, s.first_node, s.return_type, false, scripts, globals, target, files)?;
    }

    remove_stubs(arena, scripts, files)?;
    compact_unparsed(arena, scripts, globals);
    backfill_script_references(arena, scripts);
    final_checks(scripts, globals, files, warn)?;

    Ok(())
}

// ---------------------------------------------------------------------
// Element / block resolution
// ---------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn resolve_element(
    arena: &mut NodeArena,
    idx: NodeIndex,
    preferred_type: ValueType,
    allow_uppercase: bool,
    scripts: &[Script],
    globals: &[Global],
    target: CompileTarget,
    files: &[String],
) -> CompileResult<()> {
    if arena.get(idx).is_primitive {
        let raw = arena
            .get(idx)
            .string_data
            .clone()
            .expect("primitive leaf is missing its source string before resolution");

        if let Some(gtype) = lookup_global_type(globals, target, &raw) {
            let n = arena.get_mut(idx);
            n.is_global = true;
            n.value_type = gtype;
            n.string_data = Some(raw.to_lowercase());
            return reconcile(arena, idx, preferred_type, files);
        }

        specialize_primitive(arena, idx, preferred_type, allow_uppercase, scripts, &raw, files)?;
        reconcile(arena, idx, preferred_type, files)
    } else {
        resolve_block(arena, idx, preferred_type, scripts, globals, target, files)
    }
}

fn specialize_primitive(
    arena: &mut NodeArena,
    idx: NodeIndex,
    preferred_type: ValueType,
    allow_uppercase: bool,
    scripts: &[Script],
    raw: &str,
    files: &[String],
) -> CompileResult<()> {
    use ValueType::*;
    let node = arena.get(idx);
    let (file, line, column) = (node.file, node.line, node.column);

    match preferred_type {
        Void => Err(err_at(files, file, line, column, "a value was given where none is allowed")),
        Passthrough => Err(err_at(files, file, line, column, "cannot determine the type of this value")),
        Boolean => {
            let value = match raw.to_ascii_lowercase().as_str() {
                "true" | "on" | "1" => true,
                "false" | "off" | "0" => false,
                _ => return Err(err_at(files, file, line, column, format!("'{raw}' is not a valid boolean literal"))),
            };
            let n = arena.get_mut(idx);
            n.value_type = Boolean;
            n.data = NodeData::Bool(value);
            n.string_data = None;
            Ok(())
        }
        Real => {
            let value: f32 = raw
                .parse()
                .map_err(|_| err_at(files, file, line, column, format!("'{raw}' is not a valid real literal")))?;
            let n = arena.get_mut(idx);
            n.value_type = Real;
            n.data = NodeData::Real(value);
            n.string_data = None;
            Ok(())
        }
        Short => {
            let value: i64 = raw
                .parse()
                .map_err(|_| err_at(files, file, line, column, format!("'{raw}' is not a valid integer literal")))?;
            if !(i16::MIN as i64..=i16::MAX as i64).contains(&value) {
                return Err(err_at(files, file, line, column, format!("'{raw}' is out of range for a short (must be between -32768 and 32767)")));
            }
            let n = arena.get_mut(idx);
            n.value_type = Short;
            n.data = NodeData::Short(value as i16);
            n.string_data = None;
            Ok(())
        }
        Long => {
            let value: i64 = raw
                .parse()
                .map_err(|_| err_at(files, file, line, column, format!("'{raw}' is not a valid integer literal")))?;
            if !(i32::MIN as i64..=i32::MAX as i64).contains(&value) {
                return Err(err_at(files, file, line, column, format!("'{raw}' is out of range for a long (must be between -2147483648 and 2147483647)")));
            }
            let n = arena.get_mut(idx);
            n.value_type = Long;
            n.data = NodeData::Long(value as i32);
            n.string_data = None;
            Ok(())
        }
        Script => {
            let lower = raw.to_lowercase();
            let pos = scripts
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(&lower))
                .ok_or_else(|| err_at(files, file, line, column, format!("no script named '{raw}' was defined")))?;
            let n = arena.get_mut(idx);
            n.value_type = Script;
            n.data = NodeData::Short(pos as i16);
            n.string_data = Some(lower);
            Ok(())
        }
        GameDifficulty => {
            let value = match raw.to_ascii_lowercase().as_str() {
                "easy" => 0,
                "normal" => 1,
                "hard" => 2,
                "impossible" => 3,
                _ => return Err(err_at(files, file, line, column, format!("'{raw}' is not a valid game difficulty"))),
            };
            let n = arena.get_mut(idx);
            n.value_type = GameDifficulty;
            n.data = NodeData::Short(value);
            n.string_data = Some(raw.to_ascii_lowercase());
            Ok(())
        }
        Team => {
            let value = match raw.to_ascii_lowercase().as_str() {
                "player" => 1,
                "human" => 2,
                "covenant" => 3,
                "flood" => 4,
                "sentinel" => 5,
                "unused6" => 6,
                "unused7" => 7,
                "unused8" => 8,
                "unused9" => 9,
                _ => return Err(err_at(files, file, line, column, format!("'{raw}' is not a valid team"))),
            };
            let n = arena.get_mut(idx);
            n.value_type = Team;
            n.data = NodeData::Short(value);
            n.string_data = Some(raw.to_ascii_lowercase());
            Ok(())
        }
        String => {
            let n = arena.get_mut(idx);
            n.value_type = String;
            if !allow_uppercase {
                n.string_data = Some(raw.to_lowercase());
            }
            Ok(())
        }
        other => {
            let n = arena.get_mut(idx);
            n.value_type = other;
            n.string_data = Some(raw.to_lowercase());
            Ok(())
        }
    }
}

fn reconcile(arena: &mut NodeArena, idx: NodeIndex, preferred_type: ValueType, files: &[String]) -> CompileResult<()> {
    if preferred_type == ValueType::Void {
        arena.get_mut(idx).value_type = ValueType::Void;
        return Ok(());
    }
    let actual = arena.get(idx).value_type;
    match convert(preferred_type, actual) {
        Some(resolved) => {
            arena.get_mut(idx).value_type = resolved;
            Ok(())
        }
        None => {
            let n = arena.get(idx);
            Err(err_at(
                files,
                n.file,
                n.line,
                n.column,
                format!("expected a '{preferred_type}' value here, but '{actual}' cannot be converted to it"),
            ))
        }
    }
}

/// The conversion lattice of §4.4. `None` means no rule applies.
fn convert(preferred: ValueType, actual: ValueType) -> Option<ValueType> {
    use ValueType::*;
    if preferred == Passthrough {
        return Some(actual);
    }
    if preferred == actual {
        return Some(actual);
    }
    let accepted = matches!(
        (preferred, actual),
        (Real, Long) | (Real, Short) | (Long, Real) | (Short, Real) | (Short, Long) | (Boolean, Long) | (Boolean, Short)
    ) || ((preferred == Object || preferred == ObjectList) && actual.is_object_like());
    if accepted {
        Some(preferred)
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_block(
    arena: &mut NodeArena,
    node_idx: NodeIndex,
    preferred_type: ValueType,
    scripts: &[Script],
    globals: &[Global],
    target: CompileTarget,
    files: &[String],
) -> CompileResult<()> {
    let leaf = arena.get(node_idx).child_node();
    arena.get_mut(leaf).value_type = ValueType::FunctionName;
    let fn_name = arena.get(leaf).string_data.clone().expect("function-name leaf is missing its string");

    let script_pos = scripts.iter().position(|s| s.name == fn_name);

    let return_type = if let Some(pos) = script_pos {
        arena.get_mut(node_idx).is_script_call = true;
        arena.get_mut(leaf).string_data = Some(fn_name.to_lowercase());
        scripts[pos].return_type
    } else if let Some(def) = definitions::lookup_function(&fn_name, target) {
        def.return_type
    } else {
        return Err(diagnose_unknown_function(arena, leaf, globals, &fn_name, target, files));
    };
    arena.get_mut(node_idx).value_type = return_type;

    let first_arg = arena.get(leaf).next_node;

    if script_pos.is_some() {
        if !first_arg.is_none() {
            let n = arena.get(first_arg);
            return Err(err_at(files, n.file, n.line, n.column, format!("'{fn_name}' takes no parameters, but one was given")));
        }
    } else {
        let def = definitions::lookup_function(&fn_name, target).expect("looked up above");
        if fn_name == "set" || fn_name == "=" || fn_name == "!=" {
            resolve_special_form(arena, node_idx, &fn_name, first_arg, scripts, globals, target, files)?;
        } else {
            resolve_normal_arguments(arena, node_idx, def, first_arg, preferred_type, scripts, globals, target, files)?;
        }
    }

    reconcile(arena, node_idx, preferred_type, files)
}

#[allow(clippy::too_many_arguments)]
fn resolve_special_form(
    arena: &mut NodeArena,
    node_idx: NodeIndex,
    fn_name: &str,
    first_arg: NodeIndex,
    scripts: &[Script],
    globals: &[Global],
    target: CompileTarget,
    files: &[String],
) -> CompileResult<()> {
    let mut args = Vec::with_capacity(2);
    let mut cur = first_arg;
    while !cur.is_none() && args.len() < 2 {
        args.push(cur);
        cur = arena.get(cur).next_node;
    }

    if args.len() < 2 {
        let anchor = args.last().copied().unwrap_or(node_idx);
        let n = arena.get(anchor);
        return Err(err_at(files, n.file, n.line, n.column, format!("'{fn_name}' takes exactly 2 parameters, but too few were given")));
    }
    if !cur.is_none() {
        let n = arena.get(cur);
        return Err(err_at(files, n.file, n.line, n.column, format!("'{fn_name}' takes exactly 2 parameters, but more were given")));
    }

    let (e0, e1) = (args[0], args[1]);

    if fn_name == "set" {
        if !arena.get(e0).is_primitive {
            let n = arena.get(e0);
            return Err(err_at(files, n.file, n.line, n.column, "'set' requires a global as its first argument, but a function call was given"));
        }
        let name = arena.get(e0).string_data.clone().expect("primitive leaf missing string");
        let gtype = lookup_global_type(globals, target, &name).ok_or_else(|| {
            let n = arena.get(e0);
            let hint = if definitions::lookup_global_any_target(&name).is_some() {
                " (it is defined on another engine variant)"
            } else {
                ""
            };
            err_at(files, n.file, n.line, n.column, format!("no global named '{name}' was defined{hint}"))
        })?;
        {
            let n = arena.get_mut(e0);
            n.is_global = true;
            n.value_type = gtype;
            n.string_data = Some(name.to_lowercase());
        }
        arena.get_mut(node_idx).value_type = gtype;
        resolve_element(arena, e1, gtype, false, scripts, globals, target, files)
    } else {
        let g0 = global_type_of(arena, globals, target, e0);
        let g1 = global_type_of(arena, globals, target, e1);

        match (g0, g1) {
            (Some(t0), None) => {
                mark_as_global(arena, e0, t0);
                resolve_element(arena, e1, t0, false, scripts, globals, target, files)
            }
            (None, Some(t1)) => {
                mark_as_global(arena, e1, t1);
                resolve_element(arena, e0, t1, false, scripts, globals, target, files)
            }
            (Some(t0), Some(t1)) => {
                if t0 != t1 {
                    let n = arena.get(node_idx);
                    return Err(err_at(
                        files,
                        n.file,
                        n.line,
                        n.column,
                        format!("'{fn_name}' compares two globals of different types ('{t0}' and '{t1}')"),
                    ));
                }
                mark_as_global(arena, e0, t0);
                mark_as_global(arena, e1, t1);
                Ok(())
            }
            (None, None) => {
                let mut test_type = ValueType::Real;
                if !arena.get(e0).is_primitive {
                    if let Some(t) = call_return_type(arena, e0, scripts, target) {
                        test_type = t;
                    }
                } else if !arena.get(e1).is_primitive {
                    if let Some(t) = call_return_type(arena, e1, scripts, target) {
                        test_type = t;
                    }
                }
                resolve_element(arena, e0, test_type, false, scripts, globals, target, files)?;
                resolve_element(arena, e1, test_type, false, scripts, globals, target, files)
            }
        }
    }
}

fn global_type_of(arena: &NodeArena, globals: &[Global], target: CompileTarget, idx: NodeIndex) -> Option<ValueType> {
    let node = arena.get(idx);
    if !node.is_primitive {
        return None;
    }
    lookup_global_type(globals, target, node.string_data.as_deref()?)
}

fn mark_as_global(arena: &mut NodeArena, idx: NodeIndex, value_type: ValueType) {
    let name = arena.get(idx).string_data.clone().expect("primitive leaf missing string");
    let n = arena.get_mut(idx);
    n.is_global = true;
    n.value_type = value_type;
    n.string_data = Some(name.to_lowercase());
}

fn call_return_type(arena: &NodeArena, idx: NodeIndex, scripts: &[Script], target: CompileTarget) -> Option<ValueType> {
    let node = arena.get(idx);
    if node.is_primitive {
        return None;
    }
    let leaf = arena.get(node.child_node());
    let name = leaf.string_data.as_deref()?;
    if let Some(s) = scripts.iter().find(|s| s.name == name) {
        return Some(s.return_type);
    }
    definitions::lookup_function(name, target).map(|f| f.return_type)
}

#[allow(clippy::too_many_arguments)]
fn resolve_normal_arguments(
    arena: &mut NodeArena,
    node_idx: NodeIndex,
    def: &EngineFunction,
    first_arg: NodeIndex,
    preferred_type: ValueType,
    scripts: &[Script],
    globals: &[Global],
    target: CompileTarget,
    files: &[String],
) -> CompileResult<()> {
    let mut argument_index = 0usize;
    let mut cur = first_arg;

    while !cur.is_none() {
        let param = match def.parameter_at(argument_index) {
            Some(p) => p,
            None => {
                let n = arena.get(cur);
                return Err(err_at(
                    files,
                    n.file,
                    n.line,
                    n.column,
                    format!("'{}' takes {} parameter(s), but more were given", def.name, def.parameters.len()),
                ));
            }
        };
        let value_type = param.value_type;
        let allow_uppercase = param.allow_uppercase;
        let passthrough_last = param.passthrough_last;
        let next = arena.get(cur).next_node;

        let this_preferred = if value_type == ValueType::Passthrough {
            if passthrough_last && !next.is_none() {
                ValueType::Void
            } else {
                arena.get_mut(node_idx).value_type = preferred_type;
                preferred_type
            }
        } else {
            value_type
        };

        resolve_element(arena, cur, this_preferred, allow_uppercase, scripts, globals, target, files)?;
        cur = next;
        argument_index += 1;
    }

    let required = def.minimum_parameter_count();
    if argument_index < required {
        let n = arena.get(node_idx);
        return Err(err_at(
            files,
            n.file,
            n.line,
            n.column,
            format!("'{}' takes at least {} parameter(s), but only {} were given", def.name, required, argument_index),
        ));
    }
    Ok(())
}

fn lookup_global_type(globals: &[Global], target: CompileTarget, name: &str) -> Option<ValueType> {
    if let Some(g) = globals.iter().find(|g| g.name == name) {
        return Some(g.value_type);
    }
    definitions::lookup_global(name, target).map(|g| g.value_type)
}

fn diagnose_unknown_function(
    arena: &NodeArena,
    leaf: NodeIndex,
    globals: &[Global],
    fn_name: &str,
    target: CompileTarget,
    files: &[String],
) -> CompileError {
    let n = arena.get(leaf);
    let hint = if globals.iter().any(|g| g.name == fn_name) {
        " (a local global by this name exists, but this was called like a function)"
    } else if definitions::lookup_global(fn_name, target).is_some() {
        " (an engine global by this name exists, but this was called like a function)"
    } else if definitions::lookup_function_any_target(fn_name).is_some() {
        " (it is defined on another engine variant)"
    } else {
        ""
    };
    err_at(files, n.file, n.line, n.column, format!("no such function or script '{fn_name}' was defined{hint}"))
}

// ---------------------------------------------------------------------
// Stub resolution
// ---------------------------------------------------------------------

/// Marks every node reachable from `head` (the node itself, every later
/// sibling, and recursively every child subtree) as `UNPARSED`, orphaning
/// the whole subtree for the compaction pass.
fn mark_unparsed_recursive(arena: &mut NodeArena, head: NodeIndex) {
    let mut current = head;
    while !current.is_none() {
        let (next, child, is_primitive) = {
            let n = arena.get(current);
            (n.next_node, n.child_node(), n.is_primitive)
        };
        arena.get_mut(current).value_type = ValueType::Unparsed;
        if !is_primitive {
            mark_unparsed_recursive(arena, child);
        }
        current = next;
    }
}

/// Only a same-named `STATIC` script counts as a match; a same-named `STUB`
/// (or anything else) is skipped over and left for the duplicate-name check
/// in `final_checks` (Open Question 2, see DESIGN.md).
fn remove_stubs(arena: &mut NodeArena, scripts: &mut Vec<Script>, files: &[String]) -> CompileResult<()> {
    'restart: loop {
        for i in 0..scripts.len() {
            if scripts[i].script_type != ScriptType::Stub {
                continue;
            }
            for j in 0..scripts.len() {
                if j == i || scripts[j].name != scripts[i].name || scripts[j].script_type != ScriptType::Static {
                    continue;
                }
                if scripts[j].return_type != scripts[i].return_type {
                    let s = &scripts[i];
                    return Err(err_at(
                        files,
                        s.file,
                        s.line,
                        s.column,
                        format!(
                            "cannot replace stub script '{}' (returns '{}') with a static script returning '{}'",
                            s.name, s.return_type, scripts[j].return_type
                        ),
                    ));
                }
                mark_unparsed_recursive(arena, scripts[i].first_node);
                scripts.remove(i);
                continue 'restart;
            }
        }
        break;
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Node compaction
// ---------------------------------------------------------------------

fn compact_unparsed(arena: &mut NodeArena, scripts: &mut [Script], globals: &mut [Global]) {
    loop {
        let remove_at = arena.as_slice().iter().position(|n| n.value_type == ValueType::Unparsed);
        let Some(remove_at) = remove_at else { break };

        let last_at = arena.len() - 1;
        if remove_at != last_at {
            arena.nodes.swap(remove_at, last_at);
            rewrite_index(arena, scripts, globals, NodeIndex::new(last_at), NodeIndex::new(remove_at));
        }
        arena.nodes.pop();
    }
}

fn rewrite_index(arena: &mut NodeArena, scripts: &mut [Script], globals: &mut [Global], old: NodeIndex, new: NodeIndex) {
    for n in arena.nodes.iter_mut() {
        if n.next_node == old {
            n.next_node = new;
        }
        if let NodeData::Child(c) = &mut n.data {
            if *c == old {
                *c = new;
            }
        }
    }
    for s in scripts.iter_mut() {
        if s.first_node == old {
            s.first_node = new;
        }
    }
    for g in globals.iter_mut() {
        if g.first_node == old {
            g.first_node = new;
        }
    }
}

// ---------------------------------------------------------------------
// Script-call back-fill
// ---------------------------------------------------------------------

fn backfill_script_references(arena: &mut NodeArena, scripts: &[Script]) {
    for i in 0..arena.len() {
        let idx = NodeIndex::new(i);
        let is_call = arena.get(idx).is_script_call;
        if !is_call {
            continue;
        }
        let leaf = arena.get(idx).child_node();
        let name = arena.get(leaf).string_data.clone().expect("function-name leaf missing string");
        let pos = scripts
            .iter()
            .position(|s| s.name == name)
            .expect("a resolved script-call node must name a surviving script");
        arena.get_mut(idx).call_index = pos as u16;
    }
}

// ---------------------------------------------------------------------
// Final checks
// ---------------------------------------------------------------------

fn final_checks(scripts: &[Script], globals: &[Global], files: &[String], warn: &mut WarnFn) -> CompileResult<()> {
    for i in 0..scripts.len() {
        for j in (i + 1)..scripts.len() {
            if scripts[i].name == scripts[j].name {
                let s = &scripts[j];
                return Err(err_at(files, s.file, s.line, s.column, format!("multiple scripts named '{}' were defined", s.name)));
            }
        }
    }
    for i in 0..globals.len() {
        for j in (i + 1)..globals.len() {
            if globals[i].name == globals[j].name {
                let g = &globals[j];
                return Err(err_at(files, g.file, g.line, g.column, format!("multiple globals named '{}' were defined", g.name)));
            }
        }
    }
    for s in scripts {
        for g in globals {
            if s.name != g.name {
                continue;
            }
            let (file, line, column) = later_of((s.file, s.line, s.column), (g.file, g.line, g.column));
            warn(&WarningKind::NameCollision.message(&s.name), file_name(files, file), line, column);
        }
    }
    Ok(())
}

fn later_of(a: (usize, usize, usize), b: (usize, usize, usize)) -> (usize, usize, usize) {
    if b > a {
        b
    } else {
        a
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::tokenize;
    use crate::tree;
    use crate::value_type::{CompileEncoding, OptimizationLevel};

    fn compile_ok(src: &str) -> (NodeArena, Vec<Script>, Vec<Global>) {
        let tokens = tokenize(src.as_bytes(), 0, "t.hsc", CompileEncoding::Utf8).unwrap();
        let files = vec!["t.hsc".to_owned()];
        let (mut arena, decl) = tree::build(&tokens, &files, OptimizationLevel::Paranoid).unwrap();
        let mut scripts = decl.scripts;
        let mut globals = decl.globals;
        let mut warn = |_: &str, _: &str, _: usize, _: usize| {};
        resolve(&mut arena, &mut scripts, &mut globals, CompileTarget::Any, &files, &mut warn).unwrap();
        (arena, scripts, globals)
    }

    fn compile_err(src: &str) -> CompileError {
        let tokens = tokenize(src.as_bytes(), 0, "t.hsc", CompileEncoding::Utf8).unwrap();
        let files = vec!["t.hsc".to_owned()];
        let (mut arena, decl) = tree::build(&tokens, &files, OptimizationLevel::Paranoid).unwrap();
        let mut scripts = decl.scripts;
        let mut globals = decl.globals;
        let mut warn = |_: &str, _: &str, _: usize, _: usize| {};
        resolve(&mut arena, &mut scripts, &mut globals, CompileTarget::Any, &files, &mut warn).unwrap_err()
    }

    #[test]
    fn short_global_literal() {
        let (arena, _, globals) = compile_ok("(global short x 5)");
        let g = &globals[0];
        let n = arena.get(g.first_node);
        assert_eq!(n.value_type, ValueType::Short);
        assert_eq!(n.data, NodeData::Short(5));
        assert!(n.string_data.is_none());
    }

    #[test]
    fn real_global_literal() {
        let (arena, _, globals) = compile_ok("(global real x 5)");
        let n = arena.get(globals[0].first_node);
        assert_eq!(n.value_type, ValueType::Real);
        assert_eq!(n.data, NodeData::Real(5.0));
    }

    #[test]
    fn short_out_of_range_errors() {
        let e = compile_err("(global short x 70000)");
        assert!(e.message().to_lowercase().contains("range"));
    }

    #[test]
    fn equality_call_resolves_to_boolean_without_wrapper() {
        let (arena, scripts, _) = compile_ok("(script static boolean f (= 1 1))");
        let s = &scripts[0];
        let root = arena.get(s.first_node);
        assert!(!root.is_primitive);
        assert_eq!(root.value_type, ValueType::Boolean);
        let leaf = arena.get(root.child_node());
        assert_eq!(leaf.string_data.as_deref(), Some("="));
    }

    #[test]
    fn stub_replaced_by_static_leaves_one_script() {
        let (arena, scripts, _) = compile_ok("(script stub void s) (script static void s (begin))");
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].script_type, ScriptType::Static);
        assert!(arena.as_slice().iter().all(|n| n.value_type != ValueType::Unparsed));
    }

    #[test]
    fn stub_static_return_type_mismatch_errors() {
        let e = compile_err("(script stub real s) (script static void s (begin))");
        assert!(e.message().contains("cannot replace stub"));
    }

    #[test]
    fn unmatched_stub_pair_falls_through_to_duplicate_check() {
        let e = compile_err("(script stub void s) (script stub void s)");
        assert!(e.message().contains("multiple scripts"));
    }

    #[test]
    fn cond_desugars_into_linked_if_chain_typed_void() {
        let (arena, scripts, _) = compile_ok("(script static void a (cond ((= 1 1) 2) ((= 2 2) 3)))");
        let s = &scripts[0];
        let begin_root = arena.get(s.first_node);
        assert_eq!(begin_root.value_type, ValueType::Void);
    }

    #[test]
    fn set_resolves_global_and_value() {
        let (arena, _, globals) = compile_ok("(global short x 0) (script static void f (set x 5))");
        let g = &globals[0];
        assert_eq!(g.value_type, ValueType::Short);
        let _ = arena;
    }

    #[test]
    fn script_call_backfills_index_after_stub_removal() {
        let (arena, scripts, _) = compile_ok(
            "(script stub void helper) (script static void helper (begin)) (script static void caller (helper))",
        );
        let caller = scripts.iter().find(|s| s.name == "caller").unwrap();
        let helper_pos = scripts.iter().position(|s| s.name == "helper").unwrap();
        let root = arena.get(caller.first_node);
        assert!(root.is_script_call);
        assert_eq!(root.call_index as usize, helper_pos);
    }

    #[test]
    fn duplicate_script_names_error() {
        let e = compile_err("(script static void f (begin)) (script static void f (begin))");
        assert!(e.message().contains("multiple scripts"));
    }

    #[test]
    fn duplicate_global_names_error() {
        let e = compile_err("(global short x 1) (global short x 2)");
        assert!(e.message().contains("multiple globals"));
    }

    #[test]
    fn script_global_name_collision_warns_not_errors() {
        let tokens = tokenize(b"(global short f 1) (script static void f (begin))", 0, "t.hsc", CompileEncoding::Utf8).unwrap();
        let files = vec!["t.hsc".to_owned()];
        let (mut arena, decl) = tree::build(&tokens, &files, OptimizationLevel::Paranoid).unwrap();
        let mut scripts = decl.scripts;
        let mut globals = decl.globals;
        let mut warned = false;
        let mut warn = |_: &str, _: &str, _: usize, _: usize| {
            warned = true;
        };
        resolve(&mut arena, &mut scripts, &mut globals, CompileTarget::Any, &files, &mut warn).unwrap();
        assert!(warned);
    }

    #[test]
    fn object_list_accepts_unit_argument() {
        // `object_create` takes an `object_name`; exercised indirectly through
        // the conversion lattice unit test below instead, since the catalogue
        // entry names vary. This test targets the lattice directly.
        assert_eq!(convert(ValueType::ObjectList, ValueType::Unit), Some(ValueType::ObjectList));
        assert_eq!(convert(ValueType::Object, ValueType::Real), None);
    }

    #[test]
    fn long_to_short_narrowing_quirk_is_preserved() {
        assert_eq!(convert(ValueType::Short, ValueType::Long), Some(ValueType::Short));
    }
}
