//! File scopes for local reference resolution.

use dazgraph_url::NormalizedRef;

/// The file a reference was read from, plus the scope that caused that file
/// to be loaded.
///
/// DAZ instance nodes can carry `#id` references whose target lives in the
/// file that instantiated them rather than in their own file, so local
/// lookups fall back one level up this chain.
#[derive(Debug, Clone, Copy)]
pub struct FileScope<'a> {
    file: &'a NormalizedRef,
    caller: Option<&'a FileScope<'a>>,
}

impl<'a> FileScope<'a> {
    /// A scope with no caller, e.g. the scene file an import starts from.
    pub fn root(file: &'a NormalizedRef) -> Self {
        Self { file, caller: None }
    }

    /// A scope for `file`, loaded on behalf of `self`.
    pub fn nested(&'a self, file: &'a NormalizedRef) -> FileScope<'a> {
        FileScope {
            file,
            caller: Some(self),
        }
    }

    /// The file references are resolved against.
    #[inline]
    pub fn file(&self) -> &'a NormalizedRef {
        self.file
    }

    #[inline]
    pub fn caller(&self) -> Option<&'a FileScope<'a>> {
        self.caller
    }

    /// Number of scopes above this one.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.caller;
        while let Some(scope) = current {
            depth += 1;
            current = scope.caller;
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dazgraph_url::Normalizer;

    #[test]
    fn test_nesting() {
        let n = Normalizer::new(true);
        let scene = n.normalize("/Scenes/scene.duf");
        let figure = n.normalize("/data/figure.dsf");

        let root = FileScope::root(&scene);
        let nested = root.nested(&figure);

        assert_eq!(root.depth(), 0);
        assert_eq!(nested.depth(), 1);
        assert_eq!(nested.file(), &figure);
        assert_eq!(nested.caller().map(|c| c.file()), Some(&scene));
    }
}
