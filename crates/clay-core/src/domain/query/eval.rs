use std::cmp::Ordering;

use serde_json::Value;

use super::{CompareOp, FilterExpr, FilterPath, FilterStep, Operand, Segment, Selector, is_truthy};
use crate::domain::JsonPath;

type Match<'a> = (JsonPath, &'a Value);

pub(super) fn evaluate<'a>(segments: &[Segment], document: &'a Value) -> Vec<Match<'a>> {
    let mut current: Vec<Match<'a>> = vec![(JsonPath::root(), document)];

    for segment in segments {
        let mut next = Vec::new();
        for (path, node) in &current {
            match segment {
                Segment::Child(selectors) => {
                    for selector in selectors {
                        apply(selector, path, *node, document, &mut next);
                    }
                }
                Segment::Descendant(selectors) => {
                    let mut stack = vec![(path.clone(), *node)];
                    let mut visited = Vec::new();
                    // pre-order, document order
                    while let Some((p, n)) = stack.pop() {
                        let mut children = children_of(&p, n);
                        children.reverse();
                        stack.extend(children);
                        visited.push((p, n));
                    }
                    for (p, n) in &visited {
                        for selector in selectors {
                            apply(selector, p, *n, document, &mut next);
                        }
                    }
                }
            }
        }
        current = next;
    }

    current
}

fn children_of<'a>(path: &JsonPath, node: &'a Value) -> Vec<Match<'a>> {
    match node {
        Value::Object(map) => map
            .iter()
            .map(|(key, child)| (path.child_key(key.as_str()), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, child)| (path.child_index(i), child))
            .collect(),
        _ => Vec::new(),
    }
}

fn apply<'a>(
    selector: &Selector,
    path: &JsonPath,
    node: &'a Value,
    root: &'a Value,
    out: &mut Vec<Match<'a>>,
) {
    match selector {
        Selector::Name(name) => {
            if let Some(child) = node.as_object().and_then(|map| map.get(name)) {
                out.push((path.child_key(name.as_str()), child));
            }
        }
        Selector::Index(index) => {
            if let Value::Array(items) = node {
                if let Some(i) = normalize_index(*index, items.len()) {
                    out.push((path.child_index(i), &items[i]));
                }
            }
        }
        Selector::Wildcard => out.extend(children_of(path, node)),
        Selector::Slice { start, end, step } => {
            if let Value::Array(items) = node {
                for i in slice_indices(items.len(), *start, *end, *step) {
                    out.push((path.child_index(i), &items[i]));
                }
            }
        }
        Selector::Filter(filter) => {
            out.extend(
                children_of(path, node)
                    .into_iter()
                    .filter(|(_, child)| test(filter, child, root)),
            );
        }
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { len + index } else { index };
    (0..len).contains(&i).then_some(i as usize)
}

fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Vec<usize> {
    let len = len as i64;
    let step = step.unwrap_or(1);
    if step == 0 || len == 0 {
        return Vec::new();
    }
    let clamp = |bound: i64, lower: i64, upper: i64| {
        let b = if bound < 0 { len + bound } else { bound };
        b.clamp(lower, upper)
    };

    let mut indices = Vec::new();
    if step > 0 {
        let lo = start.map_or(0, |s| clamp(s, 0, len));
        let hi = end.map_or(len, |e| clamp(e, 0, len));
        let mut i = lo;
        while i < hi {
            indices.push(i as usize);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    } else {
        let hi = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let lo = end.map_or(-1, |e| clamp(e, -1, len - 1));
        let mut i = hi;
        while i > lo {
            indices.push(i as usize);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    }
    indices
}

fn test(filter: &FilterExpr, current: &Value, root: &Value) -> bool {
    match filter {
        FilterExpr::Or(a, b) => test(a, current, root) || test(b, current, root),
        FilterExpr::And(a, b) => test(a, current, root) && test(b, current, root),
        FilterExpr::Not(inner) => !test(inner, current, root),
        FilterExpr::Truthy(path) => resolve(path, current, root).is_some_and(is_truthy),
        FilterExpr::Compare { left, op, right } => {
            let l = operand(left, current, root);
            let r = operand(right, current, root);
            compare(l, *op, r)
        }
    }
}

fn operand<'a>(operand: &'a Operand, current: &'a Value, root: &'a Value) -> Option<&'a Value> {
    match operand {
        Operand::Path(path) => resolve(path, current, root),
        Operand::Literal(value) => Some(value),
    }
}

fn resolve<'a>(path: &FilterPath, current: &'a Value, root: &'a Value) -> Option<&'a Value> {
    let start = if path.absolute { root } else { current };
    path.steps.iter().try_fold(start, |node, step| match (step, node) {
        (FilterStep::Name(name), Value::Object(map)) => map.get(name),
        (FilterStep::Index(i), Value::Array(items)) => {
            normalize_index(*i, items.len()).map(|i| &items[i])
        }
        _ => None,
    })
}

fn compare(left: Option<&Value>, op: CompareOp, right: Option<&Value>) -> bool {
    match op {
        CompareOp::Eq => equal(left, right),
        CompareOp::Ne => !equal(left, right),
        CompareOp::Lt => order(left, right) == Some(Ordering::Less),
        CompareOp::Gt => order(left, right) == Some(Ordering::Greater),
        CompareOp::Le => matches!(order(left, right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Ge => {
            matches!(order(left, right), Some(Ordering::Greater | Ordering::Equal))
        }
    }
}

fn equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn order(left: Option<&Value>, right: Option<&Value>) -> Option<Ordering> {
    match (left?, right?) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
