//! Accumulators that parsers build into.
//!
//! Grammars never construct their result trees directly. They are handed a
//! [`Builder`] by the data model and only call [`add`](Builder::add) and
//! [`bind`](Builder::bind), so the same grammar can build into any tree
//! representation.

/// Accumulates items into a value.
pub trait Builder<I> {
    /// The value produced by [`bind`](Self::bind).
    type Output;

    /// Appends one item.
    fn add(&mut self, item: I);

    /// Finishes accumulation.
    fn bind(self) -> Self::Output;
}

impl<I> Builder<I> for Vec<I> {
    type Output = Vec<I>;

    #[inline]
    fn add(&mut self, item: I) {
        self.push(item);
    }

    #[inline]
    fn bind(self) -> Vec<I> {
        self
    }
}

impl Builder<char> for String {
    type Output = String;

    #[inline]
    fn add(&mut self, item: char) {
        self.push(item);
    }

    #[inline]
    fn bind(self) -> String {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<B: Builder<char>>(mut builder: B, text: &str) -> B::Output {
        for c in text.chars() {
            builder.add(c);
        }
        builder.bind()
    }

    #[test]
    fn test_builders() {
        assert_eq!(collect(String::new(), "abc"), "abc");
        assert_eq!(collect(Vec::new(), "ab"), vec!['a', 'b']);
    }
}
