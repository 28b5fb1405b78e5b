/// Anything that can be stacked in a masonry column. For photos the height is
/// the aspect ratio, i.e. the rendered height at unit column width.
pub trait Tile {
    fn height(&self) -> f64;
}

impl<T: Tile + ?Sized> Tile for &T {
    fn height(&self) -> f64 {
        (**self).height()
    }
}

fn shortest_column(heights: &[f64]) -> usize {
    let mut best = 0;
    for (index, height) in heights.iter().enumerate().skip(1) {
        if *height < heights[best] {
            best = index;
        }
    }
    best
}

/// Greedily places each item, in order, at the bottom of the currently
/// shortest column. Ties go to the leftmost column.
pub fn calculate_masonry<T: Tile>(
    items: impl IntoIterator<Item = T>,
    column_count: usize,
) -> Vec<Vec<T>> {
    let mut columns: Vec<Vec<T>> = (0..column_count).map(|_| Vec::new()).collect();
    if column_count == 0 {
        return columns;
    }
    let mut heights = vec![0f64; column_count];

    for item in items {
        let column = shortest_column(&heights);
        heights[column] += item.height();
        columns[column].push(item);
    }

    columns
}
