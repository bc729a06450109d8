//! Insertion-ordered declaration maps and dependency ordering of headers.

use std::collections::HashSet;

use anyhow::Result;

use crate::error::NodeError;

/// Small insertion-ordered string map; re-setting a key keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
}

impl OrderedMap {
    pub fn set(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Top-level declarations of one stage, keyed by id, plus the edges between them.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    headers: OrderedMap,
    dependencies: Vec<(String, Vec<String>)>,
}

impl HeaderMap {
    pub fn contains(&self, id: &str) -> bool {
        self.headers.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.headers.get(id)
    }

    pub fn insert(&mut self, id: &str, text: String) {
        self.headers.set(id, text);
    }

    /// Header ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Record that header `id` must be printed after header `on`.
    pub fn add_dependency(&mut self, id: &str, on: &str) {
        if id == on {
            return;
        }
        let index = match self.dependencies.iter().position(|(k, _)| k == id) {
            Some(index) => index,
            None => {
                self.dependencies.push((id.to_string(), Vec::new()));
                self.dependencies.len() - 1
            }
        };
        let deps = &mut self.dependencies[index].1;
        if !deps.iter().any(|d| d == on) {
            deps.push(on.to_string());
        }
    }

    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.dependencies
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, deps)| deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.headers.clear();
        self.dependencies.clear();
    }

    /// Header texts ordered so every dependency precedes its user. Headers without edges
    /// keep insertion order; a cycle is rejected with [`NodeError::CyclicHeaders`].
    pub fn sorted(&self) -> Result<Vec<&str>> {
        let mut sorted = Vec::with_capacity(self.headers.len());
        let mut visited = HashSet::new();
        let mut visiting = Vec::new();
        for (id, _) in self.headers.iter() {
            self.visit(id, &mut visiting, &mut visited, &mut sorted)?;
        }
        Ok(sorted)
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        visiting: &mut Vec<&'a str>,
        visited: &mut HashSet<&'a str>,
        sorted: &mut Vec<&'a str>,
    ) -> Result<()> {
        if visited.contains(id) {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|v| *v == id) {
            let mut cycle: Vec<String> = visiting[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Err(NodeError::CyclicHeaders(cycle).into());
        }
        visiting.push(id);
        for dep in self.dependencies_of(id) {
            if self.headers.contains(dep) {
                self.visit(dep, visiting, visited, sorted)?;
            }
        }
        visiting.pop();
        visited.insert(id);
        if let Some(text) = self.headers.get(id) {
            sorted.push(text);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_map_keeps_first_position() {
        let mut map = OrderedMap::default();
        map.set("a", "1".into());
        map.set("b", "2".into());
        map.set("a", "3".into());
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn dependencies_come_first() {
        let mut headers = HeaderMap::default();
        headers.insert("B", "struct B".into());
        headers.insert("u", "uniform".into());
        headers.insert("A", "struct A".into());
        headers.add_dependency("B", "A");
        assert_eq!(headers.sorted().unwrap(), vec!["struct A", "struct B", "uniform"]);
    }

    #[test]
    fn edges_to_unknown_headers_are_ignored() {
        let mut headers = HeaderMap::default();
        headers.insert("f", "fn f".into());
        headers.add_dependency("f", "Missing");
        assert_eq!(headers.sorted().unwrap(), vec!["fn f"]);
    }

    #[test]
    fn cycles_are_rejected_with_their_path() {
        let mut headers = HeaderMap::default();
        headers.insert("A", "struct A".into());
        headers.insert("B", "struct B".into());
        headers.add_dependency("A", "B");
        headers.add_dependency("B", "A");
        let err = headers.sorted().unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::CyclicHeaders(vec!["A".into(), "B".into(), "A".into()]))
        );
    }

    #[test]
    fn clear_drops_edges_too() {
        let mut headers = HeaderMap::default();
        headers.insert("A", "a".into());
        headers.add_dependency("B", "A");
        headers.clear();
        assert!(headers.is_empty());
        assert!(headers.dependencies_of("B").is_empty());
    }
}
