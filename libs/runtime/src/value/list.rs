//! Immutable cons lists
//!
//! A [`List`] is a nullable shared pointer to a cons cell. Cells are never
//! mutated after construction, so any number of lists may share a tail.
//! Traversals (length, iteration, comparison, drop) walk the spine in a loop
//! so long lists cannot exhaust the stack.

use super::Value;
use std::fmt;
use std::sync::Arc;

struct Cons {
    head: Value,
    tail: List,
}

/// Immutable singly-linked list of values; the empty list is the null pair
#[derive(Clone, Default)]
pub struct List(Option<Arc<Cons>>);

impl List {
    pub fn empty() -> Self {
        List(None)
    }

    /// New list with `head` in front of `tail`, sharing `tail`
    pub fn cons(head: Value, tail: List) -> Self {
        List(Some(Arc::new(Cons { head, tail })))
    }

    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<Value> = values.into_iter().collect();
        values
            .into_iter()
            .rev()
            .fold(List::empty(), |tail, head| List::cons(head, tail))
    }

    /// Text as a list of code points
    pub fn from_text(text: &str) -> Self {
        List::from_values(text.chars().map(|c| Value::Number(u32::from(c) as f64)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn head(&self) -> Option<&Value> {
        self.0.as_deref().map(|cell| &cell.head)
    }

    pub fn tail(&self) -> Option<List> {
        self.0.as_deref().map(|cell| cell.tail.clone())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.0.as_deref(),
        }
    }

    pub fn nth(&self, index: usize) -> Option<&Value> {
        self.iter().nth(index)
    }

    /// New list with the elements of `self` followed by `other`; `other` is shared
    pub fn append(&self, other: &List) -> List {
        let front: Vec<Value> = self.iter().cloned().collect();
        front
            .into_iter()
            .rev()
            .fold(other.clone(), |tail, head| List::cons(head, tail))
    }

    /// Elements `start..end`, clamped to the list bounds
    pub fn slice(&self, start: usize, end: usize) -> List {
        let end = end.min(self.len());
        if start >= end {
            return List::empty();
        }
        List::from_values(self.iter().skip(start).take(end - start).cloned())
    }

    pub fn reverse(&self) -> List {
        self.iter()
            .fold(List::empty(), |tail, head| List::cons(head.clone(), tail))
    }

    /// Decode as printable text
    ///
    /// Every element must be an integral number naming a Unicode scalar value
    /// that is not a control character. The empty list decodes to "".
    pub fn to_text(&self) -> Option<String> {
        let mut text = String::new();
        for value in self.iter() {
            let Value::Number(code) = value else {
                return None;
            };
            if code.fract() != 0.0 || *code < 0.0 || *code > u32::MAX as f64 {
                return None;
            }
            let c = char::from_u32(*code as u32)?;
            if c.is_control() {
                return None;
            }
            text.push(c);
        }
        Some(text)
    }

    /// Both lists are the very same cell (or both empty)
    pub fn ptr_eq(&self, other: &List) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl Drop for List {
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cell) => next = cell.tail.0.take(),
                // still shared: the remaining spine belongs to someone else
                Err(_) => break,
            }
        }
    }
}

impl FromIterator<Value> for List {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        List::from_values(iter)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a> {
    next: Option<&'a Cons>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        self.next = cell.tail.0.as_deref();
        Some(&cell.head)
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> List {
        values.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn test_cons_shares_tail() {
        let tail = numbers(&[2.0, 3.0]);
        let list = List::cons(Value::Number(1.0), tail.clone());

        assert_eq!(list.len(), 3);
        assert!(list.tail().unwrap().ptr_eq(&tail));
        assert_eq!(tail.len(), 2);
    }

    #[test]
    fn test_append_and_reverse() {
        let front = numbers(&[1.0, 2.0]);
        let back = numbers(&[3.0]);
        let joined = front.append(&back);

        let collected: Vec<f64> = joined
            .iter()
            .map(|v| match v {
                Value::Number(n) => *n,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(collected, vec![1.0, 2.0, 3.0]);
        assert_eq!(joined.reverse().head(), Some(&Value::Number(3.0)));
        assert_eq!(front.len(), 2);
    }

    #[test]
    fn test_text_round_trip() {
        let text = List::from_text("héllo");
        assert_eq!(text.to_text().as_deref(), Some("héllo"));
        assert_eq!(List::empty().to_text().as_deref(), Some(""));
    }

    #[test]
    fn test_non_printable_lists_are_not_text() {
        assert_eq!(numbers(&[10.0]).to_text(), None);
        assert_eq!(numbers(&[65.5]).to_text(), None);
        assert_eq!(numbers(&[-1.0]).to_text(), None);
        assert_eq!(List::from_values(vec![Value::Nil]).to_text(), None);
    }

    #[test]
    fn test_long_list_drop_and_len() {
        let list: List = (0..200_000).map(|n| Value::Number(n as f64)).collect();
        assert_eq!(list.len(), 200_000);
        drop(list);
    }
}
