//! Built-in example diagrams offered by the template picker.

/// A named example document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub icon: &'static str,
    pub source: &'static str,
}

impl Template {
    /// Lines shown in the picker's preview: the first four, then `...` if
    /// there are more.
    pub fn preview_lines(&self) -> Vec<&'static str> {
        let mut lines: Vec<&'static str> = self.source.lines().take(PREVIEW_LINES + 1).collect();
        if lines.len() > PREVIEW_LINES {
            lines.truncate(PREVIEW_LINES);
            lines.push("...");
        }
        lines
    }
}

const PREVIEW_LINES: usize = 4;

/// Picker filter tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Category {
    #[default]
    All,
    Basic,
    Process,
    Data,
    Advanced,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Basic,
        Self::Process,
        Self::Data,
        Self::Advanced,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Basic => "Basic",
            Self::Process => "Process",
            Self::Data => "Data",
            Self::Advanced => "Advanced",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|c| *c == self).unwrap_or(0)
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Template names in this category. `None` means every template.
    const fn members(self) -> Option<&'static [&'static str]> {
        match self {
            Self::All => None,
            Self::Basic => Some(&["Flowchart", "Pie Chart", "Mindmap"]),
            Self::Process => Some(&[
                "Sequence Diagram",
                "State Diagram",
                "User Journey",
                "Timeline",
            ]),
            Self::Data => Some(&["Class Diagram", "Entity Relationship", "Gantt Chart"]),
            Self::Advanced => Some(&["Git Graph", "Quadrant Chart"]),
        }
    }

    pub fn contains(self, template: &Template) -> bool {
        self.members()
            .is_none_or(|names| names.contains(&template.name))
    }
}

/// Templates in `category`, in catalog order.
pub fn templates_in(category: Category) -> Vec<&'static Template> {
    TEMPLATES.iter().filter(|t| category.contains(t)).collect()
}

/// Look up a template by name, ignoring ASCII case.
pub fn find(name: &str) -> Option<&'static Template> {
    TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

/// Document shown when the editor starts without a file.
pub const DEFAULT_SOURCE: &str = "graph TD
    A[Start] --> B{Is it?}
    B -->|Yes| C[OK]
    B -->|No| D[End]
    C --> D";

pub static TEMPLATES: [Template; 12] = [
    Template {
        name: "Flowchart",
        icon: "📊",
        source: DEFAULT_SOURCE,
    },
    Template {
        name: "Sequence Diagram",
        icon: "🔄",
        source: "sequenceDiagram
    participant Alice
    participant Bob
    Alice->>John: Hello John, how are you?
    loop Healthcheck
        John->>John: Fight against hypochondria
    end
    Note right of John: Rational thoughts <br/>prevail!
    John-->>Alice: Great!
    John->>Bob: How about you?
    Bob-->>John: Jolly good!",
    },
    Template {
        name: "Gantt Chart",
        icon: "📅",
        source: "gantt
    title A Gantt Diagram
    dateFormat  YYYY-MM-DD
    section Section
    A task           :a1, 2014-01-01, 30d
    Another task     :after a1  , 20d
    section Another
    Task in sec      :2014-01-12  , 12d
    another task      : 24d",
    },
    Template {
        name: "Class Diagram",
        icon: "🏗️",
        source: "classDiagram
    Animal <|-- Duck
    Animal <|-- Fish
    Animal <|-- Zebra
    Animal : +int age
    Animal : +String gender
    Animal: +isMammal()
    Animal: +mate()
    class Duck{
        +String beakColor
        +swim()
        +quack()
    }
    class Fish{
        -int sizeInFeet
        -canEat()
    }
    class Zebra{
        +bool is_wild
        +run()
    }",
    },
    Template {
        name: "State Diagram",
        icon: "🔄",
        source: "stateDiagram-v2
    [*] --> Still
    Still --> [*]

    Still --> Moving
    Moving --> Still
    Moving --> Crash
    Crash --> [*]",
    },
    Template {
        name: "Entity Relationship",
        icon: "🗃️",
        source: "erDiagram
    CUSTOMER ||--o{ ORDER : places
    ORDER ||--|{ LINE-ITEM : contains
    CUSTOMER }|..|{ DELIVERY-ADDRESS : uses
    
    CUSTOMER {
        string name
        string custNumber
        string sector
    }
    ORDER {
        int orderNumber
        string deliveryAddress
    }
    LINE-ITEM {
        string productCode
        int quantity
        float pricePerUnit
    }",
    },
    Template {
        name: "User Journey",
        icon: "🚶",
        source: "journey
    title My working day
    section Go to work
      Make tea: 5: Me
      Go upstairs: 3: Me
      Do work: 1: Me, Cat
    section Go home
      Go downstairs: 5: Me
      Sit down: 5: Me",
    },
    Template {
        name: "Pie Chart",
        icon: "🥧",
        source: "pie title Pets adopted by volunteers\n\"Dogs\" : 386\n\"Cats\" : 85\n\"Rats\" : 15",
    },
    Template {
        name: "Git Graph",
        icon: "🌲",
        source: "gitgraph
    commit
    branch develop
    checkout develop
    commit
    commit
    checkout main
    merge develop
    commit
    commit",
    },
    Template {
        name: "Mindmap",
        icon: "🧠",
        source: "mindmap
  root((mindmap))
    Origins
      Long history
      ::icon(fa fa-book)
      Popularisation
        British popular psychology author Tony Buzan
    Research
      On effectiveness<br/>and features
      On Automatic creation
        Uses
            Creative techniques
            Strategic planning
            Argument mapping
    Tools
      Pen and paper
      Mermaid",
    },
    Template {
        name: "Timeline",
        icon: "⏰",
        source: "timeline
    title History of Social Media Platform
    2002 : LinkedIn
    2004 : Facebook
         : Google
    2005 : Youtube
    2006 : Twitter",
    },
    Template {
        name: "Quadrant Chart",
        icon: "📐",
        source: "quadrantChart
    title Reach and influence
    x-axis Low Reach --> High Reach
    y-axis Low Influence --> High Influence
    quadrant-1 We should expand
    quadrant-2 Need to promote
    quadrant-3 Re-evaluate
    quadrant-4 May be improved
    Campaign A: [0.3, 0.6]
    Campaign B: [0.45, 0.23]
    Campaign C: [0.57, 0.69]
    Campaign D: [0.78, 0.34]
    Campaign E: [0.40, 0.34]",
    },
];
