//! The tree builder: the flat token stream becomes a flat, index-linked
//! node graph. Recognizes the top-level `global`/`script` forms and
//! desugars `cond` into a chain of `if` calls (§4.3 of the design).

use crate::declarations::{normalize_name, Global, Script};
use crate::error::{CompileError, CompileResult};
use crate::node::{Node, NodeArena, NodeIndex};
use crate::token::Token;
use crate::value_type::{OptimizationLevel, ScriptType, ValueType};

pub(crate) struct BuiltDeclarations {
    pub scripts: Vec<Script>,
    pub globals: Vec<Global>,
}

/// Count depth-0 `global`/`script` forms (Phase A) purely to size the
/// output vectors; top-level structural errors are re-diagnosed for real in
/// Phase B, since a single pass here would have to duplicate its error
/// messages anyway.
fn count_declarations(tokens: &[Token]) -> (usize, usize) {
    let mut scripts = 0;
    let mut globals = 0;
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_left_paren() {
            if let Some(next) = tokens.get(i + 1) {
                match next.string.as_str() {
                    "global" => globals += 1,
                    "script" => scripts += 1,
                    _ => {}
                }
            }
        }
        i += 1;
    }
    (scripts, globals)
}

fn find_matching_rparen(tokens: &[Token], open_index: usize) -> usize {
    let mut depth = 0i32;
    for (offset, t) in tokens[open_index..].iter().enumerate() {
        if t.is_left_paren() {
            depth += 1;
        } else if t.is_right_paren() {
            depth -= 1;
            if depth == 0 {
                return open_index + offset;
            }
        }
    }
    unreachable!("tokenizer already verified parenthesis balance")
}

fn file_name<'a>(files: &'a [String], index: usize) -> &'a str {
    files.get(index).map(|s| s.as_str()).unwrap_or("<unknown>")
}

/// Read one element (a leaf or a parenthesized block) starting at `*pos`.
fn read_element(tokens: &[Token], pos: &mut usize, arena: &mut NodeArena, files: &[String]) -> CompileResult<NodeIndex> {
    if tokens[*pos].is_left_paren() {
        read_block(tokens, pos, arena, files)
    } else {
        let t = &tokens[*pos];
        let idx = arena.push(Node::new_primitive_word(t.string.clone(), t.file, t.line, t.column));
        *pos += 1;
        Ok(idx)
    }
}

/// Read sibling elements until (but not past) the next unmatched right
/// parenthesis at this depth, linking them via `next_node`. Returns the
/// head of the chain, or `NodeIndex::NONE` if there were none.
fn read_sibling_sequence(tokens: &[Token], pos: &mut usize, arena: &mut NodeArena, files: &[String]) -> CompileResult<NodeIndex> {
    let mut head = NodeIndex::NONE;
    let mut tail: Option<NodeIndex> = None;
    while !tokens[*pos].is_right_paren() {
        let elem = read_element(tokens, pos, arena, files)?;
        if let Some(t) = tail {
            arena.get_mut(t).next_node = elem;
        } else {
            head = elem;
        }
        tail = Some(elem);
    }
    Ok(head)
}

/// Read a parenthesized block starting at `*pos` (which must be `(`).
/// Handles the empty-block error, the "block opens with `(`" error, and the
/// `cond` desugar; otherwise builds one interior node whose `child_node` is
/// the first sibling (by convention the function-name leaf, enforced by the
/// resolver, not here).
fn read_block(tokens: &[Token], pos: &mut usize, arena: &mut NodeArena, files: &[String]) -> CompileResult<NodeIndex> {
    let open = &tokens[*pos];
    let (file, line, column) = (open.file, open.line, open.column);
    *pos += 1;

    if tokens[*pos].is_right_paren() {
        return Err(CompileError::syntax(file_name(files, file), line, column, "empty block"));
    }
    if tokens[*pos].is_left_paren() {
        let t = &tokens[*pos];
        return Err(CompileError::syntax(
            file_name(files, t.file),
            t.line,
            t.column,
            "a block cannot open with '(' in function-name position",
        ));
    }
    if tokens[*pos].string.eq_ignore_ascii_case("cond") {
        return read_cond(tokens, pos, arena, files, file, line, column);
    }

    let head = read_sibling_sequence(tokens, pos, arena, files)?;
    *pos += 1; // consume this block's own ')'
    Ok(arena.push(Node::new_interior(ValueType::Unparsed, head, file, line, column)))
}

/// Desugar `(cond (<predicate> <result…>) …)` into a chain of `if` calls.
/// `*pos` is positioned at the `cond` token itself.
fn read_cond(
    tokens: &[Token],
    pos: &mut usize,
    arena: &mut NodeArena,
    files: &[String],
    file: usize,
    line: usize,
    column: usize,
) -> CompileResult<NodeIndex> {
    *pos += 1; // skip "cond"

    let mut first_if = NodeIndex::NONE;
    let mut prev_begin: Option<NodeIndex> = None;

    while !tokens[*pos].is_right_paren() {
        if !tokens[*pos].is_left_paren() {
            let t = &tokens[*pos];
            return Err(CompileError::syntax(file_name(files, t.file), t.line, t.column, "a cond clause must be a block"));
        }
        let clause = &tokens[*pos];
        let (cfile, cline, ccolumn) = (clause.file, clause.line, clause.column);
        *pos += 1; // skip clause '('

        if tokens[*pos].is_right_paren() {
            return Err(CompileError::syntax(file_name(files, cfile), cline, ccolumn, "a cond clause cannot be empty"));
        }
        let predicate = read_element(tokens, pos, arena, files)?;
        if tokens[*pos].is_right_paren() {
            return Err(CompileError::syntax(file_name(files, cfile), cline, ccolumn, "a cond clause must have a result"));
        }
        let results_head = read_sibling_sequence(tokens, pos, arena, files)?;
        *pos += 1; // consume clause's ')'

        let begin_leaf = arena.push(Node::new_primitive_word("begin".to_owned(), cfile, cline, ccolumn));
        arena.get_mut(begin_leaf).next_node = results_head;
        let begin_node = arena.push(Node::new_interior(ValueType::Unparsed, begin_leaf, cfile, cline, ccolumn));

        let if_leaf = arena.push(Node::new_primitive_word("if".to_owned(), cfile, cline, ccolumn));
        arena.get_mut(if_leaf).next_node = predicate;
        arena.get_mut(predicate).next_node = begin_node;
        let if_node = arena.push(Node::new_interior(ValueType::Unparsed, if_leaf, cfile, cline, ccolumn));

        match prev_begin {
            Some(prev) => arena.get_mut(prev).next_node = if_node,
            None => first_if = if_node,
        }
        prev_begin = Some(begin_node);
    }
    *pos += 1; // consume cond's own ')'

    if first_if.is_none() {
        return Err(CompileError::syntax(file_name(files, file), line, column, "cond must have at least one clause"));
    }
    Ok(first_if)
}

fn read_type_keyword(tokens: &[Token], pos: &mut usize, files: &[String]) -> CompileResult<ValueType> {
    let t = &tokens[*pos];
    let ty = ValueType::from_keyword(&t.string.to_lowercase())
        .ok_or_else(|| CompileError::syntax(file_name(files, t.file), t.line, t.column, format!("unknown type '{}'", t.string)))?;
    *pos += 1;
    Ok(ty)
}

fn read_name(tokens: &[Token], pos: &mut usize, files: &[String]) -> CompileResult<String> {
    let t = &tokens[*pos];
    if t.paren != 0 {
        return Err(CompileError::syntax(file_name(files, t.file), t.line, t.column, "expected a name"));
    }
    let name = normalize_name(&t.string);
    *pos += 1;
    Ok(name)
}

fn parse_global(tokens: &[Token], pos: &mut usize, end: usize, arena: &mut NodeArena, files: &[String]) -> CompileResult<Global> {
    let kw = &tokens[*pos];
    let (file, line, column) = (kw.file, kw.line, kw.column);
    *pos += 2; // skip '(' and "global"

    let value_type = read_type_keyword(tokens, pos, files)?;
    let name = read_name(tokens, pos, files)?;
    let first_node = read_element(tokens, pos, arena, files)?;

    if *pos != end {
        let t = &tokens[*pos];
        return Err(CompileError::syntax(file_name(files, t.file), t.line, t.column, "unexpected extra tokens in global declaration"));
    }
    *pos += 1; // consume ')'

    Ok(Global { name, value_type, first_node, file, line, column })
}

#[allow(clippy::too_many_arguments)]
fn build_script_body(
    tokens: &[Token],
    pos: &mut usize,
    end: usize,
    arena: &mut NodeArena,
    files: &[String],
    optimization: OptimizationLevel,
    file: usize,
    line: usize,
    column: usize,
) -> CompileResult<NodeIndex> {
    let head = read_sibling_sequence(tokens, pos, arena, files)?;
    if *pos != end {
        let t = &tokens[*pos];
        return Err(CompileError::syntax(file_name(files, t.file), t.line, t.column, "unexpected extra tokens in script body"));
    }

    let single_call = head.index().is_some()
        && arena.get(head).next_node.is_none()
        && !arena.get(head).is_primitive;

    let omit = if single_call && optimization >= OptimizationLevel::DedupeExtra {
        true
    } else if single_call && optimization >= OptimizationLevel::PreventGenerationalLoss {
        let fn_leaf = arena.get(head).child_node();
        !fn_leaf.is_none() && arena.get(fn_leaf).string_data.as_deref() == Some("begin")
    } else {
        false
    };

    if omit {
        Ok(head)
    } else {
        let begin_leaf = arena.push(Node::new_primitive_word("begin".to_owned(), file, line, column));
        arena.get_mut(begin_leaf).next_node = head;
        Ok(arena.push(Node::new_interior(ValueType::Unparsed, begin_leaf, file, line, column)))
    }
}

fn parse_script(
    tokens: &[Token],
    pos: &mut usize,
    end: usize,
    arena: &mut NodeArena,
    files: &[String],
    optimization: OptimizationLevel,
) -> CompileResult<Script> {
    let kw = &tokens[*pos];
    let (file, line, column) = (kw.file, kw.line, kw.column);
    *pos += 2; // skip '(' and "script"

    let type_tok = &tokens[*pos];
    let script_type = ScriptType::from_keyword(&type_tok.string.to_lowercase()).ok_or_else(|| {
        CompileError::syntax(file_name(files, type_tok.file), type_tok.line, type_tok.column, format!("unknown script type '{}'", type_tok.string))
    })?;
    *pos += 1;

    let return_type = if script_type.always_returns_void() {
        ValueType::Void
    } else {
        read_type_keyword(tokens, pos, files)?
    };

    let name = read_name(tokens, pos, files)?;

    let first_node = build_script_body(tokens, pos, end, arena, files, optimization, file, line, column)?;

    *pos += 1; // consume ')'

    Ok(Script { name, return_type, script_type, first_node, file, line, column })
}

/// Build the node graph and declaration tables from the full accumulated
/// token stream (Phase A + Phase B of §4.3). `files` is the instance's
/// accumulated file-name list, indexed by each token's `file`.
pub(crate) fn build(tokens: &[Token], files: &[String], optimization: OptimizationLevel) -> CompileResult<(NodeArena, BuiltDeclarations)> {
    let (script_count, global_count) = count_declarations(tokens);
    let mut arena = NodeArena::new();
    arena.nodes.reserve(tokens.len());

    let mut scripts = Vec::with_capacity(script_count);
    let mut globals = Vec::with_capacity(global_count);

    let mut pos = 0;
    while pos < tokens.len() {
        if !tokens[pos].is_left_paren() {
            let t = &tokens[pos];
            return Err(CompileError::syntax(file_name(files, t.file), t.line, t.column, "expected '(' at top level"));
        }
        let open = pos;
        let end = find_matching_rparen(tokens, open);
        let keyword = tokens.get(open + 1).map(|t| t.string.as_str()).unwrap_or("");

        match keyword {
            "global" => {
                let g = parse_global(tokens, &mut pos, end, &mut arena, files)?;
                globals.push(g);
            }
            "script" => {
                let s = parse_script(tokens, &mut pos, end, &mut arena, files, optimization)?;
                scripts.push(s);
            }
            _ => {
                let t = &tokens[open + 1];
                return Err(CompileError::syntax(file_name(files, t.file), t.line, t.column, "expected 'global' or 'script'"));
            }
        }

        debug_assert_eq!(pos, end + 1, "declaration parser must consume exactly its own form");
    }

    Ok((arena, BuiltDeclarations { scripts, globals }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::tokenize;
    use crate::value_type::CompileEncoding;

    fn build_src(src: &str, optimization: OptimizationLevel) -> (NodeArena, BuiltDeclarations) {
        let tokens = tokenize(src.as_bytes(), 0, "t.hsc", CompileEncoding::Utf8).unwrap();
        let files = vec!["t.hsc".to_owned()];
        build(&tokens, &files, optimization).unwrap()
    }

    #[test]
    fn single_global() {
        let (arena, decl) = build_src("(global short x 5)", OptimizationLevel::Paranoid);
        assert_eq!(decl.globals.len(), 1);
        let g = &decl.globals[0];
        assert_eq!(g.name, "x");
        assert_eq!(g.value_type, ValueType::Short);
        let node = arena.get(g.first_node);
        assert!(node.is_primitive);
        assert_eq!(node.string_data.as_deref(), Some("5"));
    }

    #[test]
    fn script_body_wrapped_in_begin_by_default() {
        let (arena, decl) = build_src("(script static real f (+ 1 2))", OptimizationLevel::Paranoid);
        let s = &decl.scripts[0];
        let root = arena.get(s.first_node);
        let fn_leaf = arena.get(root.child_node());
        assert_eq!(fn_leaf.string_data.as_deref(), Some("begin"));
    }

    #[test]
    fn aggressive_optimization_omits_wrapper() {
        let (arena, decl) = build_src("(script static real f (+ 1 2))", OptimizationLevel::DedupeExtra);
        let s = &decl.scripts[0];
        let root = arena.get(s.first_node);
        let fn_leaf = arena.get(root.child_node());
        assert_eq!(fn_leaf.string_data.as_deref(), Some("+"));
    }

    #[test]
    fn cond_desugars_to_if_chain() {
        let (arena, decl) = build_src(
            "(script static void a (cond ((= 1 1) 2) ((= 2 2) 3)))",
            OptimizationLevel::Paranoid,
        );
        let s = &decl.scripts[0];
        // unwrap the implicit begin wrapper
        let begin_root = arena.get(s.first_node);
        let outer_if = arena.get(begin_root.child_node()).next_node;
        let if_node = arena.get(outer_if);
        let if_leaf = arena.get(if_node.child_node());
        assert_eq!(if_leaf.string_data.as_deref(), Some("if"));

        let predicate = if_leaf.next_node;
        let predicate_node = arena.get(predicate);
        let predicate_fn_leaf = arena.get(predicate_node.child_node());
        assert_eq!(predicate_fn_leaf.string_data.as_deref(), Some("="));

        let then_begin_idx = arena.get(predicate).next_node;
        let then_begin = arena.get(then_begin_idx);
        let then_fn_leaf = arena.get(then_begin.child_node());
        assert_eq!(then_fn_leaf.string_data.as_deref(), Some("begin"));

        let next_if = arena.get(then_begin.child_node()).next_node;
        assert!(!next_if.is_none(), "second clause should chain as the else of the first if");
    }

    #[test]
    fn empty_block_is_an_error() {
        let tokens = tokenize(b"(global short x ())", 0, "t.hsc", CompileEncoding::Utf8).unwrap();
        let files = vec!["t.hsc".to_owned()];
        assert!(build(&tokens, &files, OptimizationLevel::Paranoid).is_err());
    }

    #[test]
    fn stub_requires_return_type() {
        let tokens = tokenize(b"(script stub void s)", 0, "t.hsc", CompileEncoding::Utf8).unwrap();
        let files = vec!["t.hsc".to_owned()];
        let (_, decl) = build(&tokens, &files, OptimizationLevel::Paranoid).unwrap();
        assert_eq!(decl.scripts[0].return_type, ValueType::Void);
    }

    #[test]
    fn startup_script_has_no_explicit_return_type_token() {
        // "x" here is the name, not a return type, since startup scripts are void.
        let (_, decl) = build_src("(script startup x (print \"hi\"))", OptimizationLevel::Paranoid);
        assert_eq!(decl.scripts[0].name, "x");
        assert_eq!(decl.scripts[0].return_type, ValueType::Void);
    }
}
