//! The per-sample processing trait shared by filters and effects.
//!
//! Everything in the voice and VCO chains is mono, `f32` in and `f32` out.
//! Concrete chains are built with [`EffectExt::chain`] so the hot loop is
//! statically dispatched; `dyn Effect` stays available where a runtime choice
//! is unavoidable.

/// Mono audio processor.
///
/// # Example
///
/// ```rust
/// use tonegrid_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Process one sample, advancing internal state by one step.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block. `input` and `output` must have equal length.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Recompute sample-rate dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear delay lines and filter history without touching parameters.
    fn reset(&mut self);
}

/// Fluent series chaining for any [`Effect`].
pub trait EffectExt: Effect + Sized {
    /// Feed the output of `self` into `next`.
    ///
    /// ```rust,ignore
    /// let chain = ladder.chain(chorus).chain(echo);
    /// ```
    fn chain<E: Effect>(self, next: E) -> Chain<Self, E> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Effect> EffectExt for T {}

/// Two effects in series, created by [`EffectExt::chain`].
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: Effect, B: Effect> Effect for Chain<A, B> {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mid = self.first.process(input);
        self.second.process(mid)
    }

    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.first.process_block(input, output);
        self.second.process_block_inplace(output);
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.first.set_sample_rate(sample_rate);
        self.second.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

impl<A, B> Chain<A, B> {
    /// The first stage.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The first stage, mutably.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// The second stage.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// The second stage, mutably.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scale(f32);

    impl Effect for Scale {
        fn process(&mut self, input: f32) -> f32 {
            input * self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    struct Offset(f32);

    impl Effect for Offset {
        fn process(&mut self, input: f32) -> f32 {
            input + self.0
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {}
    }

    #[test]
    fn chain_runs_in_order() {
        let mut chain = Scale(2.0).chain(Offset(1.0));
        assert_eq!(chain.process(3.0), 7.0);

        let mut reversed = Offset(1.0).chain(Scale(2.0));
        assert_eq!(reversed.process(3.0), 8.0);
    }

    #[test]
    fn chain_block_matches_per_sample() {
        let input = [0.0, 0.5, -0.5, 1.0];
        let mut block = [0.0; 4];
        Scale(0.5).chain(Offset(0.25)).process_block(&input, &mut block);

        let mut chain = Scale(0.5).chain(Offset(0.25));
        for (i, &x) in input.iter().enumerate() {
            assert_eq!(block[i], chain.process(x));
        }
    }

    #[test]
    fn chain_accessors() {
        let mut chain = Scale(2.0).chain(Offset(1.0));
        chain.first_mut().0 = 3.0;
        chain.second_mut().0 = 0.0;
        assert_eq!(chain.first().0, 3.0);
        assert_eq!(chain.second().0, 0.0);
        assert_eq!(chain.process(1.0), 3.0);
    }
}
