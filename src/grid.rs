use core::str::FromStr;

pub type Position = (usize, usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (raw_width, raw_height) = s.split_once('x').ok_or(format!("invalid format: {}", s))?;

        let width = raw_width
            .parse::<usize>()
            .map_err(|_| format!("invalid width: {}", raw_width))?;
        let height = raw_height
            .parse::<usize>()
            .map_err(|_| format!("invalid height: {}", raw_height))?;

        Ok(Size { width, height })
    }
}

/// Row-major 2D storage addressed by `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

pub struct GridIter<'a, T> {
    grid: &'a Grid<T>,
    pos: usize,
}

impl<T> Grid<T> {
    pub fn new<F>(width: usize, height: usize, initializer: &mut F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                data.push(initializer(x, y));
            }
        }

        Self {
            data,
            width,
            height,
        }
    }

    /// Wraps already laid out row-major cells.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, &'static str> {
        if data.len() != width * height {
            Err("Cell count does not match dimensions")?
        }

        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn iter(&self) -> GridIter<T> {
        GridIter { grid: self, pos: 0 }
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            None
        } else {
            Some(x + (y * self.width))
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.index(x, y).map(|index| &self.data[index])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        let index = self.index(x, y)?;

        self.data.get_mut(index)
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<(), &'static str> {
        let index = self.index(x, y).ok_or("Cell out of range")?;

        self.data[index] = value;

        Ok(())
    }

    /// Builds a grid of the same dimensions by converting every cell.
    pub fn try_map<U, E, F>(&self, mut convert: F) -> Result<Grid<U>, E>
    where
        F: FnMut(usize, usize, &T) -> Result<U, E>,
    {
        let data = self
            .iter()
            .map(|(x, y, cell)| convert(x, y, cell))
            .collect::<Result<Vec<U>, E>>()?;

        Ok(Grid {
            data,
            width: self.width,
            height: self.height,
        })
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, mut convert: F) -> Grid<U> {
        Grid {
            data: self.data.iter().map(&mut convert).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<'a, T> IntoIterator for &'a Grid<T> {
    type Item = (usize, usize, &'a T);
    type IntoIter = GridIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> Iterator for GridIter<'a, T> {
    type Item = (usize, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.grid.data.len() {
            None
        } else {
            let x = self.pos % self.grid.width;
            let y = self.pos / self.grid.width;
            let value = &self.grid.data[self.pos];

            self.pos += 1;

            Some((x, y, value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_from_str() {
        assert_eq!("12x7".parse::<Size>(), Ok(Size::new(12, 7)));
        assert!("12".parse::<Size>().is_err());
        assert!("ax7".parse::<Size>().is_err());
        assert!("12x-1".parse::<Size>().is_err());
    }

    #[test]
    fn test_row_major_iteration() {
        let grid = Grid::new(3, 2, &mut |x, y| x + y * 10);
        let cells: Vec<_> = grid.iter().map(|(x, y, v)| (x, y, *v)).collect();

        assert_eq!(
            cells,
            vec![(0, 0, 0), (1, 0, 1), (2, 0, 2), (0, 1, 10), (1, 1, 11), (2, 1, 12)]
        );
    }

    #[test]
    fn test_out_of_range_access() {
        let mut grid = Grid::new(3, 2, &mut |_, _| 0u8);

        // x wraps into the next row if bounds are not checked per axis
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.get(0, 2), None);
        assert!(grid.set(3, 1, 1).is_err());
        assert!(grid.set(2, 1, 1).is_ok());
        assert_eq!(grid.get(2, 1), Some(&1));
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, vec![0u8; 3]).is_err());
        assert_eq!(Grid::from_vec(2, 2, vec![0u8; 4]).map(|g| g.size()), Ok(4));
    }
}
