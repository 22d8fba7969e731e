//! Partitioned dataset abstraction.
//!
//! A dataset is split into partitions. Each partition owns a context `C`
//! and local data `D`, both materialised from the partition's upstream
//! records by builders supplied by the caller. Computations are expressed as
//! a map over partitions followed by a pairwise reduction of the partial
//! results. The reducer receives `None` for partitions that produced nothing
//! and must treat it as the identity element; partial results may be combined
//! in any order and any tree shape, so it must also be associative and
//! commutative.
//!
//! The engine itself is injected through [`DatasetBuilder`]. [`local`]
//! provides an in-process implementation backed by rayon.
use rand::rngs::StdRng;
use rand::SeedableRng;

pub mod extractor;
pub mod local;
pub mod partition;

pub use extractor::{ColumnExtractor, FeatureLabelExtractor, FnExtractor, LabelColumn, LabeledVector};
pub use local::{LocalDataset, LocalDatasetBuilder};
pub use partition::{
    LabelPartitionData, LabelPartitionDataBuilder, LabeledPartitionData,
    LabeledPartitionDataBuilder,
};

/// Settings shared by every partition of a dataset build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LearningEnvironment {
    pub seed: u64,
    partition: usize,
}

impl LearningEnvironment {
    pub fn new(seed: u64) -> Self {
        Self { seed, partition: 0 }
    }

    /// Environment seen by the builders of one partition.
    pub fn for_partition(&self, partition: usize) -> Self {
        Self {
            seed: self.seed,
            partition,
        }
    }

    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Seed derived from the global seed and the partition index.
    pub fn partition_seed(&self) -> u64 {
        self.seed
            .wrapping_add((self.partition as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.partition_seed())
    }
}

impl Default for LearningEnvironment {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Builds the per-partition context from the partition's upstream records.
pub trait PartitionContextBuilder<U, C>: Sync {
    fn build(&self, env: &LearningEnvironment, upstream: &[U]) -> anyhow::Result<C>;
}

/// Builds the per-partition local data from the upstream records and the
/// already built context.
pub trait PartitionDataBuilder<U, C, D>: Sync {
    fn build(&self, env: &LearningEnvironment, upstream: &[U], context: &C) -> anyhow::Result<D>;
}

/// Context for computations that share nothing across a partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyContext;

#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyContextBuilder;

impl<U> PartitionContextBuilder<U, EmptyContext> for EmptyContextBuilder {
    fn build(&self, _env: &LearningEnvironment, _upstream: &[U]) -> anyhow::Result<EmptyContext> {
        Ok(EmptyContext)
    }
}

/// Context carrying a partition-specific random seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedContext {
    pub seed: u64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SeedContextBuilder;

impl<U> PartitionContextBuilder<U, SeedContext> for SeedContextBuilder {
    fn build(&self, env: &LearningEnvironment, _upstream: &[U]) -> anyhow::Result<SeedContext> {
        Ok(SeedContext {
            seed: env.partition_seed(),
        })
    }
}

/// A materialised partitioned dataset.
///
/// Resources are held until [`Dataset::close`] is called or the dataset is
/// dropped, whichever comes first.
pub trait Dataset<C, D> {
    /// Apply `map` to every partition and combine the partial results with
    /// `reduce`. Returns `None` when there are no partitions.
    fn try_compute<R, M, F>(&self, map: M, reduce: F) -> anyhow::Result<Option<R>>
    where
        R: Send,
        M: Fn(&C, &D) -> anyhow::Result<Option<R>> + Send + Sync,
        F: Fn(Option<R>, Option<R>) -> Option<R> + Send + Sync;

    /// Infallible-mapper variant of [`Dataset::try_compute`].
    fn compute<R, M, F>(&self, map: M, reduce: F) -> anyhow::Result<Option<R>>
    where
        R: Send,
        M: Fn(&C, &D) -> Option<R> + Send + Sync,
        F: Fn(Option<R>, Option<R>) -> Option<R> + Send + Sync,
    {
        self.try_compute(|context, data| Ok(map(context, data)), reduce)
    }

    /// Release the partitions.
    fn close(self) -> anyhow::Result<()>
    where
        Self: Sized;
}

/// Entry point of a partitioned dataset engine. Implementations are shared
/// read-only between concurrent trainings.
pub trait DatasetBuilder<U>: Sync {
    type Dataset<C: Send + Sync, D: Send + Sync>: Dataset<C, D>;

    fn build<C, D, CB, DB>(
        &self,
        env: &LearningEnvironment,
        context_builder: CB,
        data_builder: DB,
    ) -> anyhow::Result<Self::Dataset<C, D>>
    where
        C: Send + Sync,
        D: Send + Sync,
        CB: PartitionContextBuilder<U, C>,
        DB: PartitionDataBuilder<U, C, D>;
}
