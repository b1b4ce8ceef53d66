use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use fnv::FnvHashMap;

use super::{internal::trie::Node, Matcher};
use crate::{
    endpoint::ArcEndpoint,
    http::Method,
    Endpoint, Request,
};

struct RouteEntry {
    matcher: Arc<dyn Matcher>,
    handler: ArcEndpoint,
}

/// Dispatches requests to the first registered route whose matcher accepts
/// them.
///
/// Routes are tried in registration order. The router keeps a prefix tree of
/// route prefixes, plus one tree per HTTP method that some route is
/// restricted to, so that only the routes which can possibly match a request
/// are asked to match it. The outcome is always the same as trying every
/// route in order.
///
/// Registration takes `&mut self`, dispatch takes `&self`; a router that is
/// fully built can be shared between any number of concurrent requests.
#[derive(Default)]
pub struct Router {
    routes: Vec<RouteEntry>,
    wildcard: Node,
    methods: FnvHashMap<Method, Node>,
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Router {
    /// Create a new router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route has been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register a route. Routes registered earlier take precedence.
    ///
    /// A matcher that reports an empty method set can never match, and is
    /// kept only to preserve the numbering of later routes.
    pub fn handle<M, E>(&mut self, matcher: M, ep: E)
    where
        M: Matcher,
        E: Endpoint,
    {
        let idx = self.routes.len();
        let prefix = matcher.prefix().as_bytes().to_vec();
        let methods = matcher
            .methods()
            .map(|methods| methods.iter().cloned().collect::<Vec<_>>());

        tracing::debug!(
            index = idx,
            prefix = matcher.prefix(),
            methods = ?methods,
            "register route"
        );

        match methods {
            Some(methods) => {
                for method in methods {
                    let wildcard = &self.wildcard;
                    let tree = self.methods.entry(method).or_insert_with_key(|method| {
                        tracing::debug!(
                            method = %method,
                            nodes = wildcard.size(),
                            "create method tree"
                        );
                        wildcard.clone()
                    });
                    tree.add(&prefix, idx);
                }
            }
            None => {
                self.wildcard.add(&prefix, idx);
                for tree in self.methods.values_mut() {
                    tree.add(&prefix, idx);
                }
            }
        }

        self.routes.push(RouteEntry {
            matcher: Arc::new(matcher),
            handler: Arc::new(ep),
        });
    }

    /// Find the route for the request.
    ///
    /// On success the returned request carries the bindings produced by the
    /// winning matcher along with that matcher and its handler. Otherwise it
    /// carries an unmatched marker, which hides any route selected by an
    /// enclosing router.
    pub fn route(&self, mut req: Request) -> Request {
        let tree = self.methods.get(req.method()).unwrap_or(&self.wildcard);
        let candidates = tree.find(req.path().as_bytes());

        for &idx in candidates {
            let route = &self.routes[idx];
            if let Some(bindings) = route.matcher.matches(&req) {
                tracing::trace!(
                    method = %req.method(),
                    path = req.path(),
                    candidates = candidates.len(),
                    index = idx,
                    "route matched"
                );
                req.set_bindings(bindings.with_route(route.matcher.clone(), route.handler.clone()));
                return req;
            }
        }

        tracing::trace!(
            method = %req.method(),
            path = req.path(),
            candidates = candidates.len(),
            "no route matched"
        );
        let bindings = req.bindings().unmatched();
        req.set_bindings(bindings);
        req
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::{
        endpoint::make_sync,
        route::{get, Bindings, MethodSet, Pattern},
        EndpointExt,
    };

    fn req(method: &str, path: &str) -> Request {
        Request::builder()
            .method(Method::from_bytes(method.as_bytes()).unwrap())
            .uri_str(path)
            .finish()
    }

    fn routed_index(req: &Request) -> Option<usize> {
        let bindings = req.bindings();
        if !bindings.is_matched() {
            return None;
        }
        Some(bindings.get("route").unwrap().parse().unwrap())
    }

    struct BoolMatcher(bool);

    impl Matcher for BoolMatcher {
        fn matches(&self, req: &Request) -> Option<Bindings> {
            if self.0 {
                Some(req.bindings().clone())
            } else {
                None
            }
        }
    }

    struct ParamMatcher;

    impl Matcher for ParamMatcher {
        fn matches(&self, req: &Request) -> Option<Bindings> {
            Some(req.bindings().with_param("hello", "world"))
        }
    }

    /// Accepts every request with the right prefix and method, unless its
    /// index is below the shared high water mark.
    struct TestMatcher {
        index: usize,
        mark: Arc<AtomicUsize>,
        methods: Option<MethodSet>,
        prefix: &'static str,
    }

    impl Matcher for TestMatcher {
        fn matches(&self, req: &Request) -> Option<Bindings> {
            if self.index < self.mark.load(Ordering::SeqCst) {
                return None;
            }
            if !req.path().starts_with(self.prefix) {
                return None;
            }
            if let Some(methods) = &self.methods {
                if !methods.contains(req.method()) {
                    return None;
                }
            }
            Some(req.bindings().with_param("route", self.index.to_string()))
        }

        fn methods(&self) -> Option<&MethodSet> {
            self.methods.as_ref()
        }

        fn prefix(&self) -> &str {
            self.prefix
        }
    }

    fn method_set(methods: &[&str]) -> MethodSet {
        methods
            .iter()
            .map(|m| Method::from_bytes(m.as_bytes()).unwrap())
            .collect()
    }

    fn unreachable_endpoint() -> impl Endpoint {
        make_sync(|_| -> &'static str { panic!("did not expect handler to be called") })
    }

    #[test]
    fn no_match() {
        let mut router = Router::new();
        router.handle(BoolMatcher(false), unreachable_endpoint());

        let bindings = Bindings::new()
            .with_route(Arc::new(BoolMatcher(true)), make_sync(|_| "").arced())
            .with_param("answer", "42")
            .with_path("/");
        let req = router.route(req("GET", "/").with_bindings(bindings));

        assert!(req.bindings().matcher().is_none());
        assert!(req.bindings().handler().is_none());
        assert!(!req.bindings().is_matched());
        assert_eq!(req.bindings().get("answer"), Some("42"));
    }

    #[test]
    fn empty_router() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);

        let req = router.route(req("GET", "/anything"));
        assert!(!req.bindings().is_matched());
    }

    #[test]
    fn context_propagation() {
        let mut router = Router::new();
        router.handle(ParamMatcher, make_sync(|_| ""));

        let req = router.route(req("GET", "/"));
        assert!(req.bindings().is_matched());
        assert_eq!(req.param("hello"), "world");
    }

    #[test]
    fn torture() {
        let mark = Arc::new(AtomicUsize::new(0));
        let matchers: &[(Option<&[&str]>, &str)] = &[
            (None, "/"),
            (None, "/a"),
            (Some(&["POST", "PUT"]), "/a"),
            (Some(&["GET", "POST"]), "/a"),
            (Some(&["GET"]), "/b"),
            (None, "/ab"),
            (Some(&["POST", "PUT"]), "/"),
            (None, "/ba"),
            (None, "/"),
            (Some(&[]), "/"),
            (None, "/carl"),
            (Some(&["PUT"]), "/car"),
            (None, "/cake"),
            (None, "/car"),
            (Some(&["GET"]), "/c"),
            (Some(&["POST"]), "/"),
            (Some(&["PUT"]), "/"),
        ];

        let mut router = Router::new();
        for (index, (methods, prefix)) in matchers.iter().enumerate() {
            router.handle(
                TestMatcher {
                    index,
                    mark: mark.clone(),
                    methods: methods.map(method_set),
                    prefix: *prefix,
                },
                unreachable_endpoint(),
            );
        }
        assert_eq!(router.len(), matchers.len());

        let tests: &[(&str, &str, [i32; 17])] = &[
            ("GET", "/", [0, 8, 8, 8, 8, 8, 8, 8, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("POST", "/", [0, 6, 6, 6, 6, 6, 6, 8, 8, 15, 15, 15, 15, 15, 15, 15, -1]),
            ("PUT", "/", [0, 6, 6, 6, 6, 6, 6, 8, 8, 16, 16, 16, 16, 16, 16, 16, 16]),
            ("HEAD", "/", [0, 8, 8, 8, 8, 8, 8, 8, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("GET", "/a", [0, 1, 3, 3, 8, 8, 8, 8, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("POST", "/a", [0, 1, 2, 3, 6, 6, 6, 8, 8, 15, 15, 15, 15, 15, 15, 15, -1]),
            ("PUT", "/a", [0, 1, 2, 6, 6, 6, 6, 8, 8, 16, 16, 16, 16, 16, 16, 16, 16]),
            ("HEAD", "/a", [0, 1, 8, 8, 8, 8, 8, 8, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("GET", "/b", [0, 4, 4, 4, 4, 8, 8, 8, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("POST", "/b", [0, 6, 6, 6, 6, 6, 6, 8, 8, 15, 15, 15, 15, 15, 15, 15, -1]),
            ("GET", "/ba", [0, 4, 4, 4, 4, 7, 7, 7, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("GET", "/c", [0, 8, 8, 8, 8, 8, 8, 8, 8, 14, 14, 14, 14, 14, 14, -1, -1]),
            ("POST", "/c", [0, 6, 6, 6, 6, 6, 6, 8, 8, 15, 15, 15, 15, 15, 15, 15, -1]),
            ("GET", "/ab", [0, 1, 3, 3, 5, 5, 8, 8, 8, -1, -1, -1, -1, -1, -1, -1, -1]),
            ("POST", "/ab", [0, 1, 2, 3, 5, 5, 6, 8, 8, 15, 15, 15, 15, 15, 15, 15, -1]),
            ("GET", "/carl", [0, 8, 8, 8, 8, 8, 8, 8, 8, 10, 10, 13, 13, 13, 14, -1, -1]),
            ("POST", "/carl", [0, 6, 6, 6, 6, 6, 6, 8, 8, 10, 10, 13, 13, 13, 15, 15, -1]),
            ("HEAD", "/carl", [0, 8, 8, 8, 8, 8, 8, 8, 8, 10, 10, 13, 13, 13, -1, -1, -1]),
            ("PUT", "/carl", [0, 6, 6, 6, 6, 6, 6, 8, 8, 10, 10, 11, 13, 13, 16, 16, 16]),
            ("GET", "/cake", [0, 8, 8, 8, 8, 8, 8, 8, 8, 12, 12, 12, 12, 14, 14, -1, -1]),
            ("PUT", "/cake", [0, 6, 6, 6, 6, 6, 6, 8, 8, 12, 12, 12, 12, 16, 16, 16, 16]),
            ("OHAI", "/carl", [0, 8, 8, 8, 8, 8, 8, 8, 8, 10, 10, 13, 13, 13, -1, -1, -1]),
        ];

        // Raising the mark disables the lowest routes one at a time, which
        // reveals every route the router tries for a request, in order.
        for (method, path, expected) in tests {
            let mut out = Vec::new();
            for m in 0..matchers.len() {
                mark.store(m, Ordering::SeqCst);
                let routed = router.route(req(method, path));
                out.push(routed_index(&routed).map(|i| i as i32).unwrap_or(-1));
            }
            assert_eq!(&out[..], &expected[..], "{} {}", method, path);
        }
    }

    #[test]
    fn patterns() {
        let mut router = Router::new();
        router.handle(get("/user/:name"), make_sync(|_| ""));
        router.handle(Pattern::new("/user/*"), make_sync(|_| ""));
        router.handle(Pattern::new("/:file.:ext"), make_sync(|_| ""));

        let routed = router.route(req("GET", "/user/carl"));
        assert_eq!(routed.param("name"), "carl");
        assert_eq!(routed.bindings().matcher().unwrap().prefix(), "/user/");

        let routed = router.route(req("POST", "/user/carl"));
        assert_eq!(routed.bindings().remaining_path(), "/carl");
        assert_eq!(routed.bindings().get("name"), None);

        let routed = router.route(req("GET", "/data.tar.gz"));
        assert_eq!(routed.param("file"), "data");
        assert_eq!(routed.param("ext"), "tar.gz");

        let routed = router.route(req("GET", "/data."));
        assert!(!routed.bindings().is_matched());
    }

    #[test]
    fn idempotent() {
        let mut router = Router::new();
        router.handle(Pattern::new("/a/:b"), make_sync(|_| ""));
        router.handle(Pattern::new("/a/*"), make_sync(|_| ""));

        for _ in 0..3 {
            let routed = router.route(req("GET", "/a/x"));
            assert_eq!(routed.param("b"), "x");
            let routed = router.route(req("GET", "/a/x/y"));
            assert_eq!(routed.bindings().remaining_path(), "/x/y");
        }
    }

    /// Accepts a request when its prefix and method fit and `seed` allows
    /// the path, so that some routes reject paths their prefix admits.
    struct RandomMatcher {
        index: usize,
        prefix: String,
        methods: Option<MethodSet>,
        seed: usize,
    }

    impl Matcher for RandomMatcher {
        fn matches(&self, req: &Request) -> Option<Bindings> {
            let path = req.path();
            if !path.starts_with(&self.prefix) {
                return None;
            }
            if let Some(methods) = &self.methods {
                if !methods.contains(req.method()) {
                    return None;
                }
            }
            if (path.len() + self.seed) % 3 == 0 {
                return None;
            }
            Some(req.bindings().with_param("route", self.index.to_string()))
        }

        fn methods(&self) -> Option<&MethodSet> {
            self.methods.as_ref()
        }

        fn prefix(&self) -> &str {
            &self.prefix
        }
    }

    fn random_string(rng: &mut StdRng, max_len: usize) -> String {
        let len = rng.gen_range(0..=max_len);
        (0..len)
            .map(|_| ['/', 'a', 'b', 'c'][rng.gen_range(0..4)])
            .collect()
    }

    fn random_methods(rng: &mut StdRng) -> Option<MethodSet> {
        const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];
        if rng.gen_bool(0.5) {
            return None;
        }
        Some(
            METHODS
                .iter()
                .filter(|_| rng.gen_bool(0.4))
                .map(|m| Method::from_bytes(m.as_bytes()).unwrap())
                .collect(),
        )
    }

    /// Tries every route in registration order.
    fn linear_route(matchers: &[RandomMatcher], req: &Request) -> Option<usize> {
        matchers.iter().find_map(|matcher| {
            matcher
                .matches(req)
                .map(|bindings| bindings.get("route").unwrap().parse().unwrap())
        })
    }

    #[test]
    fn same_as_linear_search() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..50 {
            let count = rng.gen_range(0..40);
            let mut reference = Vec::with_capacity(count);
            let mut router = Router::new();

            for index in 0..count {
                let prefix = random_string(&mut rng, 4);
                let methods = random_methods(&mut rng);
                let seed = rng.gen_range(0..3);
                reference.push(RandomMatcher {
                    index,
                    prefix: prefix.clone(),
                    methods: methods.clone(),
                    seed,
                });
                router.handle(
                    RandomMatcher {
                        index,
                        prefix,
                        methods,
                        seed,
                    },
                    unreachable_endpoint(),
                );
            }

            for _ in 0..100 {
                let method = ["GET", "HEAD", "POST", "PUT", "DELETE", "PATCH"][rng.gen_range(0..6)];
                let path = random_string(&mut rng, 6);
                let request = || {
                    Request::builder()
                        .method(Method::from_bytes(method.as_bytes()).unwrap())
                        .finish()
                        .with_bindings(Bindings::new().with_path(path.clone()))
                };

                let expected = linear_route(&reference, &request());
                let routed = router.route(request());
                assert_eq!(routed_index(&routed), expected, "{} {:?}", method, path);
            }
        }
    }

    #[test]
    fn prefix_soundness() {
        let routes: &[(&str, Option<&[&str]>)] = &[
            ("/", None),
            ("/a", Some(&["GET"])),
            ("/ab", None),
            ("", Some(&["POST"])),
            ("/b/c", Some(&["GET", "POST"])),
            ("/abc", None),
            ("x", Some(&["PUT"])),
            ("/a", None),
            ("/b", Some(&["POST"])),
        ];
        let mut router = Router::new();
        for (index, (prefix, methods)) in routes.iter().enumerate() {
            router.handle(
                RandomMatcher {
                    index,
                    prefix: prefix.to_string(),
                    methods: methods.map(method_set),
                    seed: 1,
                },
                unreachable_endpoint(),
            );
        }
        assert_eq!(router.methods.len(), 3);

        let mut trees = vec![(None, &router.wildcard)];
        trees.extend(router.methods.iter().map(|(method, tree)| (Some(method), tree)));

        for (method, tree) in trees {
            let admits = |methods: &Option<&[&str]>| match (method, methods) {
                (_, None) => true,
                (Some(method), Some(methods)) => methods.contains(&method.as_str()),
                (None, Some(_)) => false,
            };

            for path in ["", "/", "/a", "/ab", "/abc", "/abd", "/b", "/b/c/d", "x", "y"] {
                let candidates = tree.find(path.as_bytes());
                for &idx in candidates {
                    let (prefix, methods) = &routes[idx];
                    assert!(
                        path.starts_with(prefix) && admits(methods),
                        "route {} is a candidate for {:?} {:?}",
                        idx,
                        method,
                        path
                    );
                }
                for (idx, (prefix, methods)) in routes.iter().enumerate() {
                    if path.starts_with(prefix) && admits(methods) {
                        assert!(
                            candidates.contains(&idx),
                            "route {} is missing for {:?} {:?}",
                            idx,
                            method,
                            path
                        );
                    }
                }
            }
        }
    }

    /// A pattern that also binds its registration index.
    struct Indexed {
        index: usize,
        pattern: Pattern,
    }

    impl Matcher for Indexed {
        fn matches(&self, req: &Request) -> Option<Bindings> {
            self.pattern
                .matches(req)
                .map(|bindings| bindings.with_param("route", self.index.to_string()))
        }

        fn methods(&self) -> Option<&MethodSet> {
            self.pattern.methods()
        }

        fn prefix(&self) -> &str {
            self.pattern.prefix()
        }
    }

    fn random_pattern(rng: &mut StdRng) -> String {
        let mut pattern = String::new();
        for n in 0..rng.gen_range(0..4) {
            match rng.gen_range(0..6) {
                0 => pattern.push_str("/a"),
                1 => pattern.push_str("/b"),
                2 => pattern.push_str("/ab"),
                3 => pattern.push('/'),
                4 => pattern.push_str(&format!("/:n{}", n)),
                _ => pattern.push_str(&format!(".:e{}", n)),
            }
        }
        if rng.gen_bool(0.3) {
            pattern.push_str("/*");
        }
        pattern
    }

    fn random_path(rng: &mut StdRng) -> String {
        const SEGMENTS: &[&str] = &["/a", "/b", "/ab", "/x.y", "/%20", "/%zz", "/", ".", "/c"];
        (0..rng.gen_range(0..5))
            .map(|_| SEGMENTS[rng.gen_range(0..SEGMENTS.len())])
            .collect()
    }

    #[test]
    fn patterns_same_as_linear_search() {
        let mut rng = StdRng::seed_from_u64(0x9a77);

        for _ in 0..50 {
            let mut reference = Vec::new();
            let mut router = Router::new();

            for index in 0..rng.gen_range(0..30) {
                let text = random_pattern(&mut rng);
                let methods = random_methods(&mut rng);
                let pattern = |text: &str| match &methods {
                    Some(methods) => Pattern::new(text).with_methods(methods.iter().cloned()),
                    None => Pattern::new(text),
                };
                reference.push(Indexed {
                    index,
                    pattern: pattern(&text),
                });
                router.handle(
                    Indexed {
                        index,
                        pattern: pattern(&text),
                    },
                    unreachable_endpoint(),
                );
            }

            for _ in 0..100 {
                let method = ["GET", "HEAD", "POST", "PUT", "DELETE"][rng.gen_range(0..5)];
                let path = random_path(&mut rng);
                let request = || {
                    Request::builder()
                        .method(Method::from_bytes(method.as_bytes()).unwrap())
                        .finish()
                        .with_bindings(Bindings::new().with_path(path.clone()))
                };

                let expected = reference.iter().find_map(|matcher| {
                    matcher
                        .matches(&request())
                        .map(|bindings| bindings.get("route").unwrap().parse::<usize>().unwrap())
                });
                let routed = router.route(request());
                assert_eq!(routed_index(&routed), expected, "{} {:?}", method, path);
            }
        }
    }
}
