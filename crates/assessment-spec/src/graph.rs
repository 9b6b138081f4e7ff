use petgraph::Direction;
use petgraph::algo::{has_path_connecting, is_cyclic_directed, tarjan_scc};
use petgraph::graphmap::DiGraphMap;

use crate::spec::{QuestionId, Schema};

/// Directed graph over question ids. An edge `a -> b` means `a` is shown only
/// when `b` is answered. References to missing questions are not edges; see
/// [`DependencyGraph::dangling`].
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    schema: &'a Schema,
    inner: DiGraphMap<&'a str, ()>,
}

impl<'a> DependencyGraph<'a> {
    pub fn build(schema: &'a Schema) -> Self {
        let mut inner = DiGraphMap::new();
        for id in schema.questions.keys() {
            inner.add_node(id.as_str());
        }
        for question in schema.questions.values() {
            for dep in &question.conditional {
                if let Some((target, _)) = schema.questions.get_key_value(dep.as_str()) {
                    inner.add_edge(question.id.as_str(), target.as_str(), ());
                }
            }
        }
        Self { schema, inner }
    }

    fn node(&self, id: &str) -> Option<&'a str> {
        let schema: &'a Schema = self.schema;
        schema
            .questions
            .get_key_value(id)
            .map(|(key, _)| key.as_str())
    }

    /// Whether adding the edge `question -> dependency` would close a cycle,
    /// i.e. `question` is already reachable from `dependency`.
    pub fn would_create_cycle(&self, question: &str, dependency: &str) -> bool {
        if question == dependency {
            return true;
        }
        match (self.node(question), self.node(dependency)) {
            (Some(question), Some(dependency)) => {
                has_path_connecting(&self.inner, dependency, question, None)
            }
            _ => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.inner)
    }

    /// Groups of questions that (transitively) depend on each other.
    pub fn cycles(&self) -> Vec<Vec<QuestionId>> {
        tarjan_scc(&self.inner)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<QuestionId> =
                    component.into_iter().map(QuestionId::from).collect();
                ids.sort();
                ids
            })
            .collect()
    }

    /// Questions that list `id` in their conditional set.
    pub fn dependents(&self, id: &str) -> Vec<QuestionId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        self.inner
            .neighbors_directed(node, Direction::Incoming)
            .map(QuestionId::from)
            .collect()
    }

    /// `(question, missing dependency)` pairs, in display order.
    pub fn dangling(&self) -> Vec<(QuestionId, QuestionId)> {
        let schema = self.schema;
        schema
            .questions()
            .flat_map(|question| {
                question
                    .conditional
                    .iter()
                    .filter(move |dep| !schema.contains_question(dep.as_str()))
                    .map(move |dep| (question.id.clone(), dep.clone()))
            })
            .collect()
    }
}
