// 📚 Course Catalog - Fixed universe of courses + prerequisite edges
//
// A course's id is its IDENTITY (never changes); name and prerequisites are
// values. Prerequisites are weak references: lookup by id, no ownership.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

// ============================================================================
// COURSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Stable identifier (e.g. "INGM101")
    pub id: String,

    /// Display name
    pub name: String,

    /// Ids of the courses that must be completed first, in authoring order
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl Course {
    pub fn new(id: &str, name: &str, prerequisites: &[&str]) -> Self {
        Course {
            id: id.to_string(),
            name: name.to_string(),
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisites.is_empty()
    }

    /// Check if `id` is a direct prerequisite of this course
    pub fn requires(&self, id: &str) -> bool {
        self.prerequisites.iter().any(|p| p == id)
    }
}

/// Raw course as read from a catalog file, before it joins a catalog.
///
/// `prerequisites` may be absent entirely; that is the same as an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
}

impl From<CourseRecord> for Course {
    fn from(record: CourseRecord) -> Self {
        Course {
            id: record.id,
            name: record.name,
            prerequisites: record.prerequisites.unwrap_or_default(),
        }
    }
}

impl From<&Course> for CourseRecord {
    fn from(course: &Course) -> Self {
        CourseRecord {
            id: course.id.clone(),
            name: course.name.clone(),
            prerequisites: if course.prerequisites.is_empty() {
                None
            } else {
                Some(course.prerequisites.clone())
            },
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

/// Ordered, immutable sequence of courses.
///
/// Built once (either with [`CatalogBuilder`] or [`Catalog::from_records`])
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    /// Two-phase build from raw records.
    ///
    /// Records keep file order. A record whose id was already seen is omitted
    /// (first definition wins). Prerequisite ids are NOT resolved here: a
    /// dangling id stays in the list and simply never gets satisfied.
    pub fn from_records(records: Vec<CourseRecord>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut courses = Vec::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id.clone()) {
                tracing::warn!(course = %record.id, "duplicate course id omitted from catalog");
                continue;
            }
            courses.push(Course::from(record));
        }

        Catalog { courses }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Course> {
        self.courses.iter()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Index of the course in catalog order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.courses.iter().position(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.id.as_str()).collect()
    }

    /// Raw records, in catalog order (used by checks and export)
    pub fn to_records(&self) -> Vec<CourseRecord> {
        self.courses.iter().map(CourseRecord::from).collect()
    }

    /// SHA-256 over ids, names and prerequisite lists in catalog order.
    /// Two catalogs with the same fingerprint present the same table.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for course in &self.courses {
            hasher.update(format!(
                "{}\u{0}{}\u{0}{}\n",
                course.id,
                course.name,
                course.prerequisites.join(",")
            ));
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Course;
    type IntoIter = std::slice::Iter<'a, Course>;

    fn into_iter(self) -> Self::IntoIter {
        self.courses.iter()
    }
}

// ============================================================================
// CATALOG BUILDER
// ============================================================================

/// Handle to a course already defined in a [`CatalogBuilder`].
///
/// Prerequisites can only be named through handles, so a builder-made catalog
/// never contains a dangling reference. A handle only resolves in the builder
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseRef {
    builder: u64,
    index: usize,
}

static NEXT_BUILDER: AtomicU64 = AtomicU64::new(0);

/// Bottom-up, dependency-ordered catalog construction.
#[derive(Debug)]
pub struct CatalogBuilder {
    token: u64,
    courses: Vec<Course>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        CatalogBuilder {
            token: NEXT_BUILDER.fetch_add(1, Ordering::Relaxed),
            courses: Vec::new(),
        }
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, index: usize) -> CourseRef {
        CourseRef {
            builder: self.token,
            index,
        }
    }

    /// Id behind a handle, if this builder issued it
    fn resolve(&self, course_ref: &CourseRef) -> Option<&str> {
        if course_ref.builder != self.token {
            return None;
        }
        self.courses.get(course_ref.index).map(|c| c.id.as_str())
    }

    /// Define a course whose prerequisites were all defined earlier.
    ///
    /// Redefining an existing id is omitted; the handle of the first
    /// definition is returned instead. Handles from another builder are
    /// omitted from the prerequisite list.
    pub fn course(&mut self, id: &str, name: &str, prerequisites: &[CourseRef]) -> CourseRef {
        if let Some(index) = self.courses.iter().position(|c| c.id == id) {
            return self.handle(index);
        }

        let mut resolved = Vec::with_capacity(prerequisites.len());
        for course_ref in prerequisites {
            match self.resolve(course_ref) {
                Some(prereq) => resolved.push(prereq.to_string()),
                None => tracing::warn!(course = id, "prerequisite handle from another builder omitted"),
            }
        }

        self.courses.push(Course {
            id: id.to_string(),
            name: name.to_string(),
            prerequisites: resolved,
        });
        self.handle(self.courses.len() - 1)
    }

    pub fn build(self) -> Catalog {
        Catalog {
            courses: self.courses,
        }
    }
}

// ============================================================================
// BUILT-IN CATALOG
// ============================================================================

static BUILTIN: OnceLock<Catalog> = OnceLock::new();

/// The fixed course catalog, constructed on first use.
pub fn builtin_catalog() -> &'static Catalog {
    BUILTIN.get_or_init(build_builtin_catalog)
}

fn build_builtin_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();

    // First year
    let analisis_i = b.course("INGM101", "Análisis Matemático I", &[]);
    let algebra_i = b.course("INGM105", "Álgebra I", &[]);
    let informatica_basica = b.course("ING6102", "Informática Básica", &[]);
    let tecnologias_a = b.course("ING6301", "Tecnologías Informáticas A", &[]);

    let analisis_ii = b.course("INGM102", "Análisis Matemático II", &[analisis_i]);
    let algebra_ii = b.course("INGM106", "Álgebra II", &[algebra_i]);
    let programacion_a = b.course(
        "ING6201",
        "Programación A",
        &[analisis_i, algebra_i, informatica_basica],
    );
    let discreta = b.course(
        "INGM107",
        "Introducción a la Matemática Discreta",
        &[algebra_i, informatica_basica],
    );
    let fisica_a = b.course("INGF101", "Física A", &[analisis_i, algebra_i]);

    // Second year
    let estadistica = b.course("INGM108", "Probabilidad y Estadística", &[analisis_ii]);
    let programacion_b = b.course("ING6202", "Programación B", &[discreta, programacion_a]);
    let tecnologias_b = b.course(
        "ING6302",
        "Tecnologías Informáticas B",
        &[tecnologias_a, programacion_a],
    );
    b.course("INGF103", "Física B", &[analisis_ii, algebra_ii, fisica_a]);
    b.course(
        "ING6203",
        "Teorías de la Información y la Comunicación",
        &[estadistica, programacion_b],
    );
    b.course(
        "ING6204",
        "Fundamentos de la Arquitectura de Computadoras",
        &[fisica_a, programacion_b],
    );
    b.course("ING6205", "Programación C", &[tecnologias_b, programacion_b]);

    b.build()
}

// ============================================================================
// TESTS
// ============================================================================
