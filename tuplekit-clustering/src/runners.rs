//! Wraps the clustering engines as controllable tasks.

use tuplekit_data::SharedTupleStore;
use tuplekit_tasks::{Task, TaskError};

use crate::cluster::Cluster;
use crate::gmeans::GMeansController;
use crate::kmeans::KMeansEngine;

/// Wraps a k-means pass over a factory-managed store as a task.
///
/// The store is read-locked for the duration of the run; writers block until
/// the task finishes. Cancellation, pausing and progress work as for any task;
/// no clusters are released on a cancelled run.
///
/// # Examples
/// ```rust
/// use tuplekit_data::{InMemoryTupleListFactory, TupleListFactory, TupleStoreMut};
/// use tuplekit_clustering::{kmeans_task, KMeansConfig, KMeansEngine};
///
/// let mut factory = InMemoryTupleListFactory::new();
/// let store = factory.create_new("points", 1, 4).unwrap();
/// {
///     let mut rows = store.write().unwrap();
///     for (row, value) in [0.0, 0.1, 5.0, 5.1].iter().enumerate() {
///         rows.set_tuple(row, &[*value]);
///     }
/// }
/// let mut config = KMeansConfig::new(2);
/// config.rng_seed = Some(1);
/// let task = kmeans_task(KMeansEngine::new(config), store);
/// let (join, handle) = task.spawn();
/// let clusters = handle.get().unwrap();
/// join.join().unwrap();
/// assert_eq!(clusters.len(), 2);
/// ```
pub fn kmeans_task(engine: KMeansEngine, tuples: SharedTupleStore) -> Task<Vec<Cluster>> {
    Task::new(move |context| {
        let store = tuples.read()
            .map_err(|_| TaskError::InvalidState("the tuple store lock is poisoned".into()))?;
        engine.run(&*store, context).map_err(TaskError::from)
    })
}

/// Wraps a G-means run over a factory-managed store as a task.
///
/// See [`kmeans_task()`](kmeans_task) for the locking and lifecycle behavior.
pub fn gmeans_task(controller: GMeansController, tuples: SharedTupleStore) -> Task<Vec<Cluster>> {
    Task::new(move |context| {
        let store = tuples.read()
            .map_err(|_| TaskError::InvalidState("the tuple store lock is poisoned".into()))?;
        controller.run(&*store, context).map_err(TaskError::from)
    })
}
