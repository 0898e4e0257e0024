/// Synthesize the canonical description of a set of task indices.
///
/// The full range is `all tasks`, a singleton is `task N`, anything else
/// becomes a membership filter with the indices in input order.
pub fn describe_tasks(indices: &[usize], task_count: usize) -> String {
    if covers_all(indices, task_count) {
        return "all tasks".to_string();
    }
    if let [only] = indices {
        return format!("task {only}");
    }
    let list = indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("tasks t such that t is in {{{list}}}")
}

fn covers_all(indices: &[usize], task_count: usize) -> bool {
    if task_count == 0 || indices.is_empty() {
        return false;
    }
    let mut seen = vec![false; task_count];
    for &i in indices {
        match seen.get_mut(i) {
            Some(slot) => *slot = true,
            None => return false,
        }
    }
    seen.into_iter().all(|s| s)
}
