// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Builds plans from their test syntax.
//!
//! The syntax is:
//!
//! * `(values [<col> ...])` where each `<col>` is `name` or `name:type`.
//!   Columns without a type are `bigint`.
//! * `(project [<assignment>, ...] <input>)` where each `<assignment>` is
//!   either a bare column name, which passes that input column through, or
//!   `name = <scalar>`.
//! * `(mark_distinct <marker> [<key> ...] <hash>? <input>)`, where `<marker>`
//!   is `name` or `name:type` (`boolean` by default) and `<hash>` is an
//!   optional bare input column name.
//!
//! Scalars are column names, literals (`1`, `-2`, `1.5`, `"s"`, `true`,
//! `false`, `null`) or calls like `(add a 1)` and `(not b)`.

use std::str::FromStr;

use proc_macro2::{Delimiter, Group, TokenStream, TokenTree};

use sift_expr::{Assignments, BinaryFunc, LogicalPlan, ScalarExpr, UnaryFunc};
use sift_repr::{ColumnRef, Datum, ScalarType};

/// Builds a [`LogicalPlan`] from a string.
pub fn build_plan(s: &str) -> Result<LogicalPlan, String> {
    let mut tokens = tokenize(s)?.into_iter();
    let plan = match tokens.next() {
        Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Parenthesis => {
            build_node(&group)?
        }
        invalid => return Err(format!("expected a parenthesized plan, found {:?}", invalid)),
    };
    match tokens.next() {
        None => Ok(plan),
        Some(extra) => Err(format!("unexpected input after plan: {}", extra)),
    }
}

/// Builds a [`ScalarExpr`] from a string, resolving column names in `scope`.
pub fn build_scalar(s: &str, scope: &[ColumnRef]) -> Result<ScalarExpr, String> {
    let mut tokens = tokenize(s)?.into_iter();
    let scalar = build_scalar_from(&mut tokens, scope)?;
    match tokens.next() {
        None => Ok(scalar),
        Some(extra) => Err(format!("unexpected input after scalar: {}", extra)),
    }
}

fn tokenize(s: &str) -> Result<Vec<TokenTree>, String> {
    let stream = TokenStream::from_str(s).map_err(|e| e.to_string())?;
    Ok(stream.into_iter().collect())
}

fn build_node(group: &Group) -> Result<LogicalPlan, String> {
    let mut tokens = group.stream().into_iter().peekable();
    let kind = match tokens.next() {
        Some(TokenTree::Ident(ident)) => ident.to_string(),
        invalid => return Err(format!("expected a plan node name, found {:?}", invalid)),
    };
    let plan = match &kind[..] {
        "values" => {
            let columns = expect_bracket(tokens.next(), "values columns")?;
            let columns = build_column_decls(columns, ScalarType::Int64)?;
            LogicalPlan::try_values(columns).map_err(|e| e.to_string())?
        }
        "project" => {
            let assignments = expect_bracket(tokens.next(), "project assignments")?;
            let input = build_input(tokens.next())?;
            let assignments = build_assignments(assignments, &input.output_columns())?;
            input.try_project(assignments).map_err(|e| e.to_string())?
        }
        "mark_distinct" => {
            let mut marker = build_column_decls(
                take_column_decl(&mut tokens)?.into_iter().collect(),
                ScalarType::Bool,
            )?;
            let marker = marker.remove(0);
            let keys = expect_bracket(tokens.next(), "mark_distinct keys")?;
            let hash = match tokens.peek() {
                Some(TokenTree::Ident(_)) => tokens.next(),
                _ => None,
            };
            let input = build_input(tokens.next())?;
            let scope = input.output_columns();
            let keys = keys
                .into_iter()
                .filter(|t| !is_punct(t, ','))
                .map(|t| resolve_column(&t, &scope))
                .collect::<Result<Vec<_>, _>>()?;
            let hash = hash.map(|t| resolve_column(&t, &scope)).transpose()?;
            input
                .try_mark_distinct(marker, keys, hash)
                .map_err(|e| e.to_string())?
        }
        other => return Err(format!("unknown plan node: {}", other)),
    };
    match tokens.next() {
        None => Ok(plan),
        Some(extra) => Err(format!("unexpected argument to {}: {}", kind, extra)),
    }
}

fn build_input(token: Option<TokenTree>) -> Result<LogicalPlan, String> {
    match token {
        Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Parenthesis => {
            build_node(&group)
        }
        invalid => Err(format!("expected an input plan, found {:?}", invalid)),
    }
}

fn expect_bracket(token: Option<TokenTree>, what: &str) -> Result<Vec<TokenTree>, String> {
    match token {
        Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Bracket => {
            Ok(group.stream().into_iter().collect())
        }
        invalid => Err(format!("expected [...] for {}, found {:?}", what, invalid)),
    }
}

fn is_punct(token: &TokenTree, ch: char) -> bool {
    matches!(token, TokenTree::Punct(punct) if punct.as_char() == ch)
}

/// Takes the tokens of a single `name` or `name:type` declaration.
fn take_column_decl<I>(tokens: &mut std::iter::Peekable<I>) -> Result<Vec<TokenTree>, String>
where
    I: Iterator<Item = TokenTree>,
{
    let mut decl = match tokens.next() {
        Some(ident @ TokenTree::Ident(_)) => vec![ident],
        invalid => return Err(format!("expected a column name, found {:?}", invalid)),
    };
    if tokens.peek().map_or(false, |t| is_punct(t, ':')) {
        decl.extend(tokens.next());
        decl.extend(tokens.next());
    }
    Ok(decl)
}

fn build_column_decls(
    tokens: Vec<TokenTree>,
    default_type: ScalarType,
) -> Result<Vec<ColumnRef>, String> {
    let mut tokens = tokens
        .into_iter()
        .filter(|t| !is_punct(t, ','))
        .peekable();
    let mut columns = vec![];
    while tokens.peek().is_some() {
        let decl = take_column_decl(&mut tokens)?;
        let name = decl[0].to_string();
        let typ = match decl.get(2) {
            None if decl.len() == 1 => default_type,
            Some(TokenTree::Ident(typ)) => typ
                .to_string()
                .parse::<ScalarType>()
                .map_err(|e| e.to_string())?,
            _ => return Err(format!("invalid type for column {}", name)),
        };
        columns.push(ColumnRef::new(name, typ));
    }
    Ok(columns)
}

fn build_assignments(tokens: Vec<TokenTree>, scope: &[ColumnRef]) -> Result<Assignments, String> {
    let mut entries = vec![];
    for entry in tokens.split(|t| is_punct(t, ',')) {
        match entry {
            [] => continue,
            [name] => {
                let column = resolve_column(name, scope)?;
                entries.push((column.clone(), ScalarExpr::column(column)));
            }
            [TokenTree::Ident(name), eq, rest @ ..] if is_punct(eq, '=') => {
                let mut rest = rest.iter().cloned();
                let expr = build_scalar_from(&mut rest, scope)?;
                if let Some(extra) = rest.next() {
                    return Err(format!("unexpected input in assignment to {}: {}", name, extra));
                }
                entries.push((ColumnRef::new(name.to_string(), expr.typ()), expr));
            }
            invalid => {
                let invalid = invalid.iter().cloned().collect::<TokenStream>();
                return Err(format!("invalid assignment: {}", invalid));
            }
        }
    }
    Assignments::try_of(entries).map_err(|e| e.to_string())
}

fn resolve_column(token: &TokenTree, scope: &[ColumnRef]) -> Result<ColumnRef, String> {
    match token {
        TokenTree::Ident(ident) => {
            let name = ident.to_string();
            scope
                .iter()
                .find(|c| c.name() == name)
                .cloned()
                .ok_or_else(|| format!("no column named {} in input", name))
        }
        invalid => Err(format!("expected a column name, found {}", invalid)),
    }
}

fn build_scalar_from<I>(tokens: &mut I, scope: &[ColumnRef]) -> Result<ScalarExpr, String>
where
    I: Iterator<Item = TokenTree>,
{
    match tokens.next() {
        Some(TokenTree::Ident(ident)) => match &ident.to_string()[..] {
            "true" => Ok(ScalarExpr::literal(Datum::True, ScalarType::Bool)),
            "false" => Ok(ScalarExpr::literal(Datum::False, ScalarType::Bool)),
            "null" => Ok(ScalarExpr::literal_null(ScalarType::Int64)),
            _ => resolve_column(&TokenTree::Ident(ident), scope).map(ScalarExpr::column),
        },
        Some(TokenTree::Literal(literal)) => build_literal(&literal.to_string(), false),
        Some(TokenTree::Punct(punct)) if punct.as_char() == '-' => match tokens.next() {
            Some(TokenTree::Literal(literal)) => build_literal(&literal.to_string(), true),
            invalid => Err(format!("expected a number after -, found {:?}", invalid)),
        },
        Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Parenthesis => {
            let mut inner = group.stream().into_iter();
            let name = match inner.next() {
                Some(TokenTree::Ident(ident)) => ident.to_string(),
                invalid => return Err(format!("expected a function name, found {:?}", invalid)),
            };
            let mut args = vec![];
            let mut inner = inner.peekable();
            while inner.peek().is_some() {
                args.push(build_scalar_from(&mut inner, scope)?);
            }
            let arity = args.len();
            let mut args = args.into_iter();
            match (UnaryFunc::from_name(&name), BinaryFunc::from_name(&name), args.next(), args.next()) {
                (Some(func), _, Some(expr), None) if arity == 1 => Ok(expr.call_unary(func)),
                (_, Some(func), Some(expr1), Some(expr2)) if arity == 2 => {
                    Ok(expr1.call_binary(expr2, func))
                }
                _ => Err(format!("no function {} taking {} arguments", name, arity)),
            }
        }
        invalid => Err(format!("expected a scalar expression, found {:?}", invalid)),
    }
}

fn build_literal(literal: &str, negate: bool) -> Result<ScalarExpr, String> {
    let sign = if negate { "-" } else { "" };
    if let Some(s) = literal.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        if negate {
            return Err(format!("cannot negate {}", literal));
        }
        return Ok(ScalarExpr::literal(Datum::from(s), ScalarType::String));
    }
    if literal.contains('.') {
        let f = format!("{}{}", sign, literal)
            .parse::<f64>()
            .map_err(|e| e.to_string())?;
        return Ok(ScalarExpr::literal(Datum::Float64(f), ScalarType::Float64));
    }
    let i = format!("{}{}", sign, literal)
        .parse::<i64>()
        .map_err(|e| e.to_string())?;
    Ok(ScalarExpr::literal(Datum::Int64(i), ScalarType::Int64))
}
