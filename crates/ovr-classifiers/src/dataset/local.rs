//! In-process partitioned dataset engine.
//!
//! Partitions are plain vectors of upstream records. Building and computing
//! fan out over the rayon pool, one task per partition, and partial results
//! are combined with rayon's tree reduction, so reducers see arbitrary
//! combination orders exactly as they would on a distributed engine.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::dataset::{
    Dataset, DatasetBuilder, LearningEnvironment, PartitionContextBuilder, PartitionDataBuilder,
};

pub struct LocalDatasetBuilder<U> {
    partitions: Arc<Vec<Vec<U>>>,
    open: Arc<AtomicUsize>,
}

impl<U> Clone for LocalDatasetBuilder<U> {
    fn clone(&self) -> Self {
        Self {
            partitions: Arc::clone(&self.partitions),
            open: Arc::clone(&self.open),
        }
    }
}

impl<U> LocalDatasetBuilder<U> {
    /// Use the given partition layout as is. Empty partitions are allowed.
    pub fn from_partitions(partitions: Vec<Vec<U>>) -> Self {
        Self {
            partitions: Arc::new(partitions),
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Deal records round-robin into `n_partitions` partitions (at least one).
    pub fn from_records(records: Vec<U>, n_partitions: usize) -> Self {
        let n_partitions = n_partitions.max(1);
        let mut partitions: Vec<Vec<U>> = (0..n_partitions).map(|_| Vec::new()).collect();
        for (idx, record) in records.into_iter().enumerate() {
            partitions[idx % n_partitions].push(record);
        }
        Self::from_partitions(partitions)
    }

    /// Shuffle records with a seeded RNG before dealing them into partitions.
    pub fn shuffled(mut records: Vec<U>, n_partitions: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        records.shuffle(&mut rng);
        Self::from_records(records, n_partitions)
    }

    pub fn n_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn n_records(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn partitions(&self) -> &[Vec<U>] {
        &self.partitions
    }

    /// Number of datasets built from this builder that are not yet released.
    pub fn open_datasets(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl<U> DatasetBuilder<U> for LocalDatasetBuilder<U>
where
    U: Send + Sync,
{
    type Dataset<C: Send + Sync, D: Send + Sync> = LocalDataset<C, D>;

    fn build<C, D, CB, DB>(
        &self,
        env: &LearningEnvironment,
        context_builder: CB,
        data_builder: DB,
    ) -> anyhow::Result<LocalDataset<C, D>>
    where
        C: Send + Sync,
        D: Send + Sync,
        CB: PartitionContextBuilder<U, C>,
        DB: PartitionDataBuilder<U, C, D>,
    {
        let partitions = self
            .partitions
            .par_iter()
            .enumerate()
            .map(|(idx, upstream)| {
                let env = env.for_partition(idx);
                let context = context_builder
                    .build(&env, upstream)
                    .with_context(|| format!("failed to build context of partition {}", idx))?;
                let data = data_builder
                    .build(&env, upstream, &context)
                    .with_context(|| format!("failed to build data of partition {}", idx))?;
                Ok::<_, anyhow::Error>(Partition { context, data })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        self.open.fetch_add(1, Ordering::SeqCst);
        log::trace!(
            "Built local dataset with {} partitions ({} records)",
            partitions.len(),
            self.n_records()
        );

        Ok(LocalDataset {
            partitions,
            open: Some(Arc::clone(&self.open)),
        })
    }
}

struct Partition<C, D> {
    context: C,
    data: D,
}

/// Dataset materialised by [`LocalDatasetBuilder`].
pub struct LocalDataset<C, D> {
    partitions: Vec<Partition<C, D>>,
    open: Option<Arc<AtomicUsize>>,
}

impl<C, D> LocalDataset<C, D> {
    pub fn n_partitions(&self) -> usize {
        self.partitions.len()
    }

    fn release(&mut self) {
        if let Some(open) = self.open.take() {
            open.fetch_sub(1, Ordering::SeqCst);
            self.partitions.clear();
        }
    }
}

impl<C, D> Dataset<C, D> for LocalDataset<C, D>
where
    C: Send + Sync,
    D: Send + Sync,
{
    fn try_compute<R, M, F>(&self, map: M, reduce: F) -> anyhow::Result<Option<R>>
    where
        R: Send,
        M: Fn(&C, &D) -> anyhow::Result<Option<R>> + Send + Sync,
        F: Fn(Option<R>, Option<R>) -> Option<R> + Send + Sync,
    {
        if self.partitions.is_empty() {
            return Ok(None);
        }
        self.partitions
            .par_iter()
            .map(|partition| map(&partition.context, &partition.data))
            .try_reduce(|| None, |a, b| Ok(reduce(a, b)))
    }

    fn close(mut self) -> anyhow::Result<()> {
        self.release();
        Ok(())
    }
}

impl<C, D> Drop for LocalDataset<C, D> {
    fn drop(&mut self) {
        self.release();
    }
}
