/// A helper for building a sequence in-order from an original sequence and a
/// series of insertions, skips and copies applied to it. Works for strings
/// (iterating characters, so it is safe with UTF-8) as well as for lists of
/// values. The methods must be called in-order.
pub struct SweepBuilder<I, O>
where
    I: Iterator,
    O: Default + Extend<I::Item>,
{
    original: I,
    buffer: O,
    position: usize,
}

impl<I, O> SweepBuilder<I, O>
where
    I: Iterator,
    O: Default + Extend<I::Item>,
{
    pub fn new(original: I) -> Self {
        Self {
            original,
            buffer: O::default(),
            position: 0,
        }
    }

    /// Copy the original items up to (but excluding) `index` into the buffer.
    pub fn retain_until(&mut self, index: usize) {
        let length = index.saturating_sub(self.position);
        self.buffer.extend(self.original.by_ref().take(length));
        self.position += length;
    }

    /// Append items to the buffer without consuming the original.
    pub fn insert(&mut self, items: impl IntoIterator<Item = I::Item>) {
        self.buffer.extend(items);
    }

    /// Drop the next `length` items of the original.
    pub fn skip(&mut self, length: usize) {
        if length == 0 {
            return;
        }

        self.original.nth(length - 1);
        self.position += length;
    }

    /// Take the next item of the original without copying it.
    pub fn take_next(&mut self) -> Option<I::Item> {
        let item = self.original.next()?;
        self.position += 1;
        Some(item)
    }

    /// Copy what's left of the original and return the built sequence.
    pub fn finish(mut self) -> O {
        self.buffer.extend(self.original);
        self.buffer
    }
}

impl<I, O> std::fmt::Debug for SweepBuilder<I, O>
where
    I: Iterator,
    O: Default + Extend<I::Item> + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepBuilder")
            .field("buffer", &self.buffer)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;

    fn string_builder(original: &str) -> SweepBuilder<std::str::Chars<'_>, String> {
        SweepBuilder::new(original.chars())
    }

    #[test]
    fn test_string_sweep() {
        let mut builder = string_builder("aaa bbb ccc");

        builder.insert("ddd".chars());
        builder.skip(3);
        builder.retain_until(11);
        builder.insert(" eee".chars());

        assert_eq!(builder.finish(), "ddd bbb ccc eee");

        let mut builder = string_builder("abcde");

        builder.retain_until(1);
        builder.skip(3);

        assert_eq!(builder.finish(), "ae");
    }

    #[test]
    fn test_empty_original() {
        let mut builder = string_builder("");

        builder.insert("test".chars());
        assert_eq!(builder.finish(), "test");
    }

    #[test]
    fn test_unicode_characters() {
        let mut builder = string_builder("こんにちは");

        builder.retain_until(3);
        builder.insert("世界, ".chars());

        assert_eq!(builder.finish(), "こんに世界, ちは");
    }

    #[test]
    fn test_value_sweep() {
        let original = [json!(1), json!(2), json!(3)];
        let mut builder: SweepBuilder<_, Vec<Value>> = SweepBuilder::new(original.iter().cloned());

        builder.retain_until(1);
        let item = builder.take_next();
        builder.insert([json!(20)]);

        assert_eq!(item, Some(json!(2)));
        assert_eq!(builder.finish(), vec![json!(1), json!(20), json!(3)]);
    }
}
