mod common;

use anyhow::Result;
use wikihop::{Error, Link, OpenOptions, Page, Reader};

#[test]
fn graph_counts_and_adjacency() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;
    let graph = reader.graph();

    assert_eq!(graph.vertex_count(), 7);
    assert_eq!(graph.edge_count(), 10);
    assert_eq!(graph.forward_edges(1), [2, 3]);
    assert_eq!(graph.backward_edges(1), [2, 3, 4]);
    assert!(graph.has_edge(4, 5));
    assert!(!graph.has_edge(5, 4));
    Ok(())
}

#[test]
fn graph_out_of_range_is_empty() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;
    let graph = reader.graph();

    assert!(graph.forward_edges(0).is_empty());
    assert!(graph.backward_edges(0).is_empty());
    assert!(graph.forward_edges(7).is_empty());
    assert!(graph.backward_edges(9999).is_empty());
    Ok(())
}

#[test]
fn graph_passes_deep_validation() -> Result<()> {
    for fixture in [common::colors()?, common::lattice()?, common::branching()?] {
        fixture.reader()?.graph().validate()?;
    }
    Ok(())
}

#[test]
fn metadata_page_lookup() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;
    let metadata = reader.metadata();

    let rose = metadata.get_page_by_id(4).unwrap();
    assert_eq!((rose.id, rose.title.as_str()), (4, "Rose"));
    assert_eq!(metadata.get_page_by_id(0), None);
    assert_eq!(metadata.get_page_by_id(999_999_999), None);

    assert_eq!(metadata.get_page_by_title("Rose").map(|p| p.id), Some(4));
    assert_eq!(
        metadata.get_page_by_title("Violet (color)").map(|p| p.id),
        Some(6)
    );
    assert_eq!(metadata.get_page_by_title("xyzzy"), None);
    assert_eq!(metadata.get_page_by_title(""), None);
    Ok(())
}

#[test]
fn metadata_link_lookup() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;
    let metadata = reader.metadata();

    // edge with no text record
    assert_eq!(
        metadata.get_link(4, 1),
        Some(Link {
            src: 4,
            dst: 1,
            text: None
        })
    );
    // explicit text
    assert_eq!(
        metadata.get_link(4, 5),
        Some(Link {
            src: 4,
            dst: 5,
            text: Some("violets".to_owned())
        })
    );
    // pipe-trick sentinel
    assert_eq!(
        metadata.get_link(5, 6),
        Some(Link {
            src: 5,
            dst: 6,
            text: Some(String::new())
        })
    );
    // not an edge
    assert_eq!(metadata.get_link(4, 6), None);
    assert_eq!(metadata.get_link(1, 999_999_999), None);
    Ok(())
}

#[test]
fn open_with_lock_into_memory() -> Result<()> {
    let fixture = common::colors()?;
    let reader = Reader::open_with_options(
        &fixture.graph_path,
        &OpenOptions {
            lock_into_memory: true,
        },
    )?;

    // the advisory is best-effort; queries behave the same either way
    let dag = reader.shortest_path_annotated_dag(4, 1).unwrap();
    assert_eq!(dag.count_paths().count, 1);
    assert_eq!(reader.shortest_path(4, 1), [4, 1]);
    Ok(())
}

#[test]
fn reader_page_id_validity() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert!(!reader.is_valid_page_id(0));
    assert!(reader.is_valid_page_id(1));
    assert!(reader.is_valid_page_id(6));
    assert!(!reader.is_valid_page_id(7));
    Ok(())
}

#[test]
fn reader_random_page_id_stays_in_range() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    for _ in 0..50 {
        let id = reader.random_page_id();
        assert!(id >= 1 && id < 7, "random id {id} out of range");
    }
    Ok(())
}

#[test]
fn reader_parse_page_argument() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert_eq!(reader.parse_page_argument("Rose"), 4);
    assert_eq!(reader.parse_page_argument("xyzzy"), 0);
    assert_eq!(reader.parse_page_argument("#4"), 4);
    assert_eq!(reader.parse_page_argument("#0"), 0);
    assert_eq!(reader.parse_page_argument("#999999999"), 0);
    assert_eq!(reader.parse_page_argument("#nonsense"), 0);
    for _ in 0..10 {
        let id = reader.parse_page_argument("?");
        assert!(id >= 1 && id < 7);
    }
    Ok(())
}

#[test]
fn reader_find_page_messages() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert_eq!(reader.find_page("Rose")?.id, 4);
    assert_eq!(reader.find_page("#4")?.title, "Rose");

    match reader.find_page("xyzzy") {
        Err(err @ Error::PageNotFound(_)) => {
            assert_eq!(err.to_string(), "page not found: \"xyzzy\"")
        }
        other => panic!("expected PageNotFound, got {other:?}"),
    }
    match reader.find_page("#999") {
        Err(err @ Error::PageNotFound(_)) => {
            assert_eq!(err.to_string(), "page not found: #999")
        }
        other => panic!("expected PageNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn reader_link_lookup() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert_eq!(reader.link(4, 5)?.text.as_deref(), Some("violets"));
    match reader.link(1, 4) {
        Err(err @ Error::LinkNotFound { .. }) => {
            assert_eq!(err.to_string(), "link not found: from #1 to #4")
        }
        other => panic!("expected LinkNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn reader_titles_and_refs() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert_eq!(reader.page_title(4), "Rose");
    assert_eq!(reader.page_title(0), "untitled");
    assert_eq!(reader.page_title(999_999_999), "untitled");

    assert_eq!(reader.page_ref(4), "#4 (Rose)");
    assert_eq!(reader.page_ref(0), "#0 (untitled)");
    assert_eq!(reader.page_ref(999_999_999), "#999999999 (untitled)");
    Ok(())
}

#[test]
fn reader_link_text() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert_eq!(reader.link_text(4, 1), "Red");
    assert_eq!(reader.link_text(4, 5), "violets");
    assert_eq!(reader.link_text(5, 6), "Violet");
    assert_eq!(reader.link_text(1, 4), "unknown");
    Ok(())
}

#[test]
fn reader_link_refs() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    assert_eq!(reader.forward_link_ref(4, 1), "#1 (Red)");
    assert_eq!(
        reader.forward_link_ref(4, 5),
        "#5 (Violet (flower); displayed as: violets)"
    );
    assert_eq!(
        reader.forward_link_ref(5, 6),
        "#6 (Violet (color); displayed as: Violet)"
    );
    assert_eq!(
        reader.forward_link_ref(1, 4),
        "#4 (Rose; displayed as: unknown)"
    );

    assert_eq!(reader.backward_link_ref(4, 1), "#4 (Rose)");
    assert_eq!(
        reader.backward_link_ref(4, 5),
        "#4 (Rose; displayed as: violets)"
    );
    assert_eq!(
        reader.backward_link_ref(5, 6),
        "#5 (Violet (flower); displayed as: Violet)"
    );
    assert_eq!(
        reader.backward_link_ref(1, 4),
        "#1 (Red; displayed as: unknown)"
    );
    Ok(())
}

#[test]
fn query_results_serialize_to_json() -> Result<()> {
    let fixture = common::colors()?;
    let reader = fixture.reader()?;

    let page = Page {
        id: 4,
        title: reader.page_title(4),
    };
    let value = serde_json::to_value(&page)?;
    assert_eq!(value["title"], "Rose");

    let (_, stats) = reader.shortest_path_with_stats(4, 2);
    let value = serde_json::to_value(stats)?;
    assert_eq!(value["vertices_reached"], 4);
    Ok(())
}
