use std::mem;

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(a, b)| **a == **b).count()
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Child {
    prefix: Vec<u8>,
    node: Node,
}

/// A prefix tree over request paths.
///
/// Every node holds the indices of the routes whose required prefix is
/// satisfied by the path that leads to it, in ascending order. Children are
/// sorted by the first byte of their edge, and no two edges of a node share
/// a first byte.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct Node {
    routes: Vec<usize>,
    children: Vec<Child>,
}

impl Node {
    #[inline]
    fn find_child(&self, c: u8) -> Option<usize> {
        self.children
            .binary_search_by_key(&c, |child| child.prefix[0])
            .ok()
    }

    /// Makes route `idx` active for every path that starts with `prefix`.
    ///
    /// Indices must be added in ascending order.
    pub(crate) fn add(&mut self, prefix: &[u8], idx: usize) {
        if prefix.is_empty() {
            self.routes.push(idx);
            for child in &mut self.children {
                child.node.add(prefix, idx);
            }
            return;
        }

        match self.find_child(prefix[0]) {
            Some(pos) => {
                let child = &mut self.children[pos];
                let n = longest_common_prefix(&child.prefix, prefix);

                if n == child.prefix.len() {
                    child.node.add(&prefix[n..], idx);
                    return;
                }

                // split edge
                let suffix = child.prefix.split_off(n);
                let mut split = Node {
                    routes: self.routes.clone(),
                    children: vec![Child {
                        prefix: suffix,
                        node: mem::take(&mut child.node),
                    }],
                };
                split.add(&prefix[n..], idx);
                child.node = split;
            }
            None => {
                let mut routes = self.routes.clone();
                routes.push(idx);
                self.children.push(Child {
                    prefix: prefix.to_vec(),
                    node: Node {
                        routes,
                        children: Vec::new(),
                    },
                });
                self.children.sort_by_key(|child| child.prefix[0]);
            }
        }
    }

    /// Returns the routes that may match `path`, in ascending order.
    pub(crate) fn find(&self, mut path: &[u8]) -> &[usize] {
        let mut node = self;
        while let Some(&c) = path.first() {
            match node.find_child(c) {
                Some(pos) if path.starts_with(&node.children[pos].prefix) => {
                    let child = &node.children[pos];
                    path = &path[child.prefix.len()..];
                    node = &child.node;
                }
                _ => break,
            }
        }
        &node.routes
    }

    /// Returns the number of nodes in this tree.
    pub(crate) fn size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.node.size())
            .sum::<usize>()
    }
}
